pub(crate) mod media;
pub(crate) mod store;
pub(crate) mod svg_raster;
