//! Prints pod lifecycle events as they reach the informer.

use std::io::{self, Write};

use colored::*;
use k8s_openapi::api::core::v1::Pod;
use regex::Regex;
use tracing::warn;

use crate::error::{Error, Result};
use crate::informer::{DeletedObject, ResourceEventHandler};
use crate::models::{EventKind, EventLine, PodRef};

/// Include/exclude patterns matched against `namespace/name`.
#[derive(Clone, Debug, Default)]
pub struct PodFilter {
    include: Option<Regex>,
    exclude: Option<Regex>,
}

impl PodFilter {
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Result<Self> {
        Ok(Self {
            include: include.map(compile).transpose()?,
            exclude: exclude.map(compile).transpose()?,
        })
    }

    pub fn matches(&self, pod: &PodRef) -> bool {
        let key = pod.to_string();
        if let Some(re) = &self.exclude {
            if re.is_match(&key) {
                return false;
            }
        }
        self.include.as_ref().is_none_or(|re| re.is_match(&key))
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| Error::InvalidFilter {
        pattern: pattern.to_string(),
        source,
    })
}

/// Event handler writing one line per pod event.
pub struct PodEventPrinter<W> {
    out: W,
    filter: PodFilter,
    color: bool,
}

impl PodEventPrinter<io::Stdout> {
    pub fn stdout(filter: PodFilter, color: bool) -> Self {
        Self::new(io::stdout(), filter, color)
    }
}

impl<W: Write> PodEventPrinter<W> {
    pub fn new(out: W, filter: PodFilter, color: bool) -> Self {
        Self { out, filter, color }
    }

    fn emit(&mut self, kind: EventKind, pod: &Pod) {
        let line = EventLine {
            kind,
            pod: PodRef::from(pod),
        };
        let written = if self.color {
            let label = match kind {
                EventKind::Added => line.kind.label().green(),
                EventKind::Updated | EventKind::New => line.kind.label().yellow(),
                EventKind::Deleted => line.kind.label().red(),
            }
            .bold();
            writeln!(self.out, "{label}: {}", line.pod)
        } else {
            writeln!(self.out, "{line}")
        };
        if let Err(e) = written {
            warn!("failed to write pod event: {e}");
        }
    }
}

impl<W: Write + Send + 'static> ResourceEventHandler<Pod> for PodEventPrinter<W> {
    fn on_add(&mut self, pod: &Pod, _is_initial_list: bool) {
        if self.filter.matches(&PodRef::from(pod)) {
            self.emit(EventKind::Added, pod);
        }
    }

    fn on_update(&mut self, old: &Pod, new: &Pod) {
        if self.filter.matches(&PodRef::from(new)) {
            self.emit(EventKind::Updated, old);
            self.emit(EventKind::New, new);
        }
    }

    fn on_delete(&mut self, deleted: &DeletedObject<Pod>) {
        let pod = deleted.object();
        if self.filter.matches(&PodRef::from(pod)) {
            self.emit(EventKind::Deleted, pod);
        }
    }
}
