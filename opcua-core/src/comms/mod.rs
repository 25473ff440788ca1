// SPDX-License-Identifier: MPL-2.0

//! Endpoint url handling shared by the connection and recovery logic.

pub mod url;
