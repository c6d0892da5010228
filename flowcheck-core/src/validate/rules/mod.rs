pub(crate) mod edges;
pub(crate) mod environment;
pub(crate) mod flow;
pub(crate) mod step;
