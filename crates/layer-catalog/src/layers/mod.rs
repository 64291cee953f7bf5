// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The standard layer inventory, one module per category.
//!
//! Each module exposes plain constructor functions returning fully-wired
//! [`crate::LayerDescriptor`]s; [`all`] is the single explicit registration
//! list, so catalog content is independent of module initialisation order.

mod activation;
mod attention;
mod basic;
mod convolution;
mod normalization;
mod pooling;
mod recurrent;
mod regularization;
mod reshape;
mod source;

use crate::LayerDescriptor;

pub(crate) fn all() -> Vec<LayerDescriptor> {
    vec![
        // basic
        basic::dense(),
        basic::flatten(),
        // convolution
        convolution::conv1d(),
        convolution::conv2d(),
        convolution::conv3d(),
        convolution::separable_conv2d(),
        // pooling
        pooling::maxpool2d(),
        pooling::avgpool2d(),
        // recurrent
        recurrent::lstm(),
        recurrent::gru(),
        // activation
        activation::activation(),
        // normalization
        normalization::batch_normalization(),
        normalization::layer_normalization(),
        normalization::group_normalization(),
        normalization::instance_normalization(),
        normalization::weight_normalization(),
        normalization::local_response_normalization(),
        normalization::unit_normalization(),
        normalization::cosine_normalization(),
        // regularization
        regularization::dropout(),
        regularization::alpha_dropout(),
        regularization::gaussian_dropout(),
        regularization::spectral_normalization(),
        // attention
        attention::multi_head_attention(),
        attention::self_attention(),
        attention::additive_attention(),
        attention::attention_pooling(),
        attention::cross_attention(),
        // reshaping
        reshape::reshape(),
        reshape::permute(),
        reshape::repeat_vector(),
        reshape::lambda(),
        reshape::masking(),
        reshape::cropping2d(),
        reshape::zero_padding2d(),
        // data sources
        source::data_input(),
        source::mnist(),
    ]
}
