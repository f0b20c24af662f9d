//! Context Assembler: builds the message list sent to the generation backend.
//!
//! Layout: `[identity] + [resume?] + history`, with a fresh filter message
//! inserted before every user message. The filter message is computed from
//! the filters of *this* request, never from earlier turns.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::chat::prompts::{
    FILTERS_NONE, FILTERS_PREFIX, FILTERS_SUFFIX, IDENTITY_TEMPLATE, RESUME_TEMPLATE,
    RESUME_TRUNCATION_NOTICE,
};
use crate::errors::AppError;
use crate::jobs::JobStore;
use crate::markup::RecommendationTag;
use crate::models::chat::{FilterState, Message, Role};
use crate::models::job::JobListing;
use crate::resume::{prepare_resume, PreparedResume};

/// Per-request assembler. Holds no state beyond the borrowed store and limits.
pub struct ContextAssembler<'a> {
    jobs: &'a dyn JobStore,
    resume_max_chars: usize,
}

/// The assembled context plus facts worth logging about it.
#[derive(Debug)]
pub struct AssembledContext {
    pub messages: Vec<Message>,
    pub job_count: usize,
    pub resume_truncated: Option<bool>,
}

impl<'a> ContextAssembler<'a> {
    pub fn new(jobs: &'a dyn JobStore, resume_max_chars: usize) -> Self {
        Self {
            jobs,
            resume_max_chars,
        }
    }

    /// Fetches the open jobs and builds the context. A store failure fails
    /// the whole turn; no context without the job set is ever produced.
    pub async fn assemble(
        &self,
        history: &[Message],
        filters: &FilterState,
        resume_text: Option<&str>,
    ) -> Result<AssembledContext, AppError> {
        let jobs = self.jobs.list_open_jobs().await.map_err(|e| {
            AppError::ContextBuild(format!("Failed to load open jobs: {e:#}"))
        })?;

        let resume = resume_text.and_then(|t| prepare_resume(t, self.resume_max_chars));
        if let Some(r) = &resume {
            if r.truncated {
                info!(
                    "Resume truncated to {} characters",
                    self.resume_max_chars
                );
            }
        }

        let messages = build_context(history, filters, resume.as_ref(), &jobs);
        debug!(
            "Assembled context: {} messages ({} history), {} jobs",
            messages.len(),
            history.len(),
            jobs.len()
        );

        Ok(AssembledContext {
            messages,
            job_count: jobs.len(),
            resume_truncated: resume.map(|r| r.truncated),
        })
    }
}

/// Pure assembly over already-fetched inputs.
pub fn build_context(
    history: &[Message],
    filters: &FilterState,
    resume: Option<&PreparedResume>,
    jobs: &[JobListing],
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() * 2 + 2);
    messages.push(identity_message(jobs));

    if let Some(resume) = resume {
        messages.push(resume_message(resume));
    }

    for message in history {
        if message.role == Role::User {
            messages.push(filter_message(filters));
        }
        messages.push(message.clone());
    }

    messages
}

#[derive(Serialize)]
struct JobContext<'a> {
    id: &'a str,
    title: &'a str,
    location: &'a str,
    department: &'a str,
    description: &'a str,
}

pub fn identity_message(jobs: &[JobListing]) -> Message {
    let entries: Vec<JobContext<'_>> = jobs
        .iter()
        .map(|j| JobContext {
            id: &j.id,
            title: &j.title,
            location: &j.location,
            department: &j.department,
            description: &j.cleaned_description,
        })
        .collect();
    let jobs_json = serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string());

    Message::system(
        IDENTITY_TEMPLATE
            .replace("{tag_example}", &tag_example())
            .replace("{jobs_json}", &jobs_json),
    )
}

fn tag_example() -> String {
    RecommendationTag {
        id: "1234567".to_string(),
        title: "Software Engineer, Infrastructure".to_string(),
        department: "Engineering".to_string(),
        pay_range: Some("$180,000 - $440,000".to_string()),
        locations: vec!["Palo Alto, CA".to_string(), "San Francisco, CA".to_string()],
        summary: "Builds the training cluster; matches your distributed systems work.".to_string(),
    }
    .render()
}

pub fn resume_message(resume: &PreparedResume) -> Message {
    let mut text = resume.text.clone();
    if resume.truncated {
        text.push('\n');
        text.push_str(RESUME_TRUNCATION_NOTICE);
    }
    Message::system(RESUME_TEMPLATE.replace("{resume_text}", &text))
}

/// Builds a new filter message from the given selection.
pub fn filter_message(filters: &FilterState) -> Message {
    if filters.is_unconstrained() {
        return Message::system(FILTERS_NONE);
    }

    Message::system(format!(
        "{FILTERS_PREFIX} Locations: {}. Departments: {}. {FILTERS_SUFFIX}",
        describe_dimension(filters.active_locations()),
        describe_dimension(filters.active_departments()),
    ))
}

fn describe_dimension(values: Option<BTreeSet<&str>>) -> String {
    match values {
        Some(set) => set.into_iter().collect::<Vec<_>>().join(", "),
        None => "any".to_string(),
    }
}
