pub(crate) mod background;
pub(crate) mod cache;
pub(crate) mod caption;
pub(crate) mod category_image;
pub(crate) mod composer;
pub(crate) mod layer;
pub(crate) mod simulate;
