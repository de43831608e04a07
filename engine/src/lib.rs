//! Message resolution.
//!
//! [`ResolutionPipeline`] turns one inbound text message into exactly one
//! reply. A trigger match answers from the scripted map; everything else is
//! generated by walking an ordered chain of completion providers. When the
//! whole chain fails, the user gets a fixed apology classified by the final
//! failure.

mod pipeline;
mod reply;

pub use pipeline::{PipelineSettings, ResolutionPipeline};
pub use reply::{GENERIC_APOLOGY, Outage, RATE_LIMIT_APOLOGY, Reply};
