pub(crate) mod planner;
pub(crate) mod section;
pub(crate) mod spoken;
