pub(crate) mod adapter;
pub(crate) mod narrator;
pub(crate) mod provider;
pub(crate) mod timing;
