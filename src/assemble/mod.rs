pub(crate) mod assembler;
pub(crate) mod mood;
pub(crate) mod music;
pub(crate) mod timeline;
