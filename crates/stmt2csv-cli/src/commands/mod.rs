pub mod convert;
pub mod email;
pub mod formats;
pub mod fragments;
