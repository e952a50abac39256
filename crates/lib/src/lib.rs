//! mvb-lib: multi-version build and patch orchestration
//!
//! One canonical source tree is compiled for several target language levels:
//! - `version`: the default target version and the additional, lower ones
//! - `overlay`: merging a per-version patch directory onto the base tree
//! - `compile`: fanning compiles out across versions through a `Compiler`
//! - `publish`: routing artifacts to a snapshot or release repository
//! - `orchestrator`: the build and publish operations composed from the above

pub mod clean;
pub mod compile;
pub mod config;
pub mod consts;
pub mod orchestrator;
pub mod overlay;
pub mod publish;
pub mod report;
pub mod util;
pub mod version;
