//! Front end for the JEDEC pre-upload checks: the `jed` command and the
//! HTTP check service it can run.

pub mod cli;
pub mod logging;
pub mod server;
