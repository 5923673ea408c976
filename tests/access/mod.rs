mod archive;
mod errors;
mod link_share;
mod list;
mod support;
