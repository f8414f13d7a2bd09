pub mod context;
pub mod env;
pub mod input;
pub mod logging;
pub mod run;
pub mod workflow;

pub mod github {
    pub mod closing_issues;
}
