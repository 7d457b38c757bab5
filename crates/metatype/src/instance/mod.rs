// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Values, field bags, typed instances and cast views.

mod bag;
mod cast;
mod convert;
mod render;
mod typed;
mod value;

pub use bag::{Id, Referenceable, Struct};
pub use cast::CastView;
pub(crate) use convert::Converter;
pub(crate) use typed::InstanceType;
pub use typed::{Instance, ReferenceableInstance};
pub use value::{FromValue, Value};
