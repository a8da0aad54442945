pub mod audit;
pub mod github;
pub mod llm;
pub mod report;

pub use audit::{
    collector::collect_files,
    formatter::{format_resource, parse_resources, ParsedResource, ResourceError},
    pipeline::{AuditPipeline, PipelineConfig},
    AuditRun, Granularity, UnitReport, UnitStatus, CLEAN_SENTINEL, DEFAULT_SYSTEM_PROMPT,
};
pub use github::{comment_body, post_run_comments, CiContext, CommentPoster, GithubCommenter};
pub use llm::{AuditModel, HfChatClient, InferenceSettings};
pub use report::render_run;
