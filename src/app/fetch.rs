//! Background fetches for the view controller.
//!
//! Network calls run on spawned tokio tasks and deposit their outcome into a
//! shared inbox; the tick handler drains it on the UI thread. List outcomes
//! carry the generation they were issued under so that a slow response
//! arriving after a newer request is discarded instead of clobbering newer
//! cache or render state.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::debug;

use crate::api::{ApiError, TaskService};
use crate::app::state::ListTab;
use crate::app::uploads::UploadPipeline;
use crate::app::workflows::{SubmitOutcome, submit_task};
use crate::types::{Task, TaskDraft};

pub type FetchInbox = Arc<Mutex<Vec<FetchOutcome>>>;

#[derive(Debug)]
pub enum FetchOutcome {
    List {
        tab: ListTab,
        generation: u64,
        result: Result<Vec<Task>, ApiError>,
    },
    Detail {
        tab: ListTab,
        task_id: i64,
        result: Result<Task, ApiError>,
    },
    Submit(SubmitOutcome),
}

pub fn new_inbox() -> FetchInbox {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn push_outcome(inbox: &FetchInbox, outcome: FetchOutcome) {
    match inbox.lock() {
        Ok(mut queue) => queue.push(outcome),
        Err(poisoned) => poisoned.into_inner().push(outcome),
    }
}

pub fn drain(inbox: &FetchInbox) -> Vec<FetchOutcome> {
    match inbox.lock() {
        Ok(mut queue) => std::mem::take(&mut *queue),
        Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
    }
}

pub fn spawn_list_fetch(
    service: Arc<dyn TaskService>,
    inbox: FetchInbox,
    tab: ListTab,
    generation: u64,
    search: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = match tab {
            ListTab::Open => service.list_open(&search).await,
            ListTab::Closed => service.list_closed(&search).await,
        };
        debug!(
            tab = tab.label(),
            generation,
            ok = result.is_ok(),
            "list fetch finished"
        );
        push_outcome(
            &inbox,
            FetchOutcome::List {
                tab,
                generation,
                result,
            },
        );
    })
}

pub fn spawn_detail_fetch(
    service: Arc<dyn TaskService>,
    inbox: FetchInbox,
    tab: ListTab,
    task_id: i64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = service.get_task(task_id).await;
        debug!(
            tab = tab.label(),
            task_id,
            ok = result.is_ok(),
            "detail fetch finished"
        );
        push_outcome(
            &inbox,
            FetchOutcome::Detail {
                tab,
                task_id,
                result,
            },
        );
    })
}

pub fn spawn_submit(
    service: Arc<dyn TaskService>,
    inbox: FetchInbox,
    draft: TaskDraft,
    staged: UploadPipeline,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let outcome = submit_task(service.as_ref(), draft, &staged).await;
        push_outcome(&inbox, FetchOutcome::Submit(outcome));
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_drain_preserve_order() {
        let inbox = new_inbox();
        push_outcome(
            &inbox,
            FetchOutcome::Detail {
                tab: ListTab::Open,
                task_id: 1,
                result: Err(ApiError::NotFound(1)),
            },
        );
        push_outcome(
            &inbox,
            FetchOutcome::Detail {
                tab: ListTab::Closed,
                task_id: 2,
                result: Err(ApiError::NotFound(2)),
            },
        );

        let drained = drain(&inbox);
        assert_eq!(drained.len(), 2);
        assert!(matches!(
            drained[0],
            FetchOutcome::Detail { task_id: 1, .. }
        ));
        assert!(matches!(
            drained[1],
            FetchOutcome::Detail { task_id: 2, .. }
        ));
        assert!(drain(&inbox).is_empty());
    }
}
