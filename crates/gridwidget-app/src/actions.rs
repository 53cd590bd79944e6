//! Action handlers: UpdateAction dispatch and background task spawning
//!
//! The only suspension points of the widget live here: the hover debounce
//! timer and the hover info fetch. Neither is ever aborted. Both report back
//! through the message channel and the controller decides on arrival whether
//! the result still matters.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::hover_info::{HoverInfoFetcher, HoverInfoRequest};
use crate::message::Message;
use crate::renderer::SessionId;

/// Side effects requested by the update function
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateAction {
    /// Sleep for `delay`, then report [`Message::HoverTimerFired`]
    ScheduleHoverTimer {
        session_id: SessionId,
        request_id: u64,
        delay: Duration,
    },

    /// Fetch hover info, then report [`Message::HoverInfoFetched`]
    FetchHoverInfo {
        session_id: SessionId,
        request_id: u64,
        request: HoverInfoRequest,
    },
}

/// Execute an action by spawning a background task
pub fn handle_action<F>(action: UpdateAction, msg_tx: mpsc::UnboundedSender<Message>, fetcher: Arc<F>)
where
    F: HoverInfoFetcher + Sync + 'static,
{
    match action {
        UpdateAction::ScheduleHoverTimer {
            session_id,
            request_id,
            delay,
        } => {
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if msg_tx
                    .send(Message::HoverTimerFired {
                        session_id,
                        request_id,
                    })
                    .is_err()
                {
                    trace!("Engine gone before hover timer {} fired", request_id);
                }
            });
        }

        UpdateAction::FetchHoverInfo {
            session_id,
            request_id,
            request,
        } => {
            tokio::spawn(async move {
                debug!("Fetching hover info for '{}' ({})", request.id, request_id);
                let result = HoverInfoFetcher::fetch_info(fetcher.as_ref(), &request)
                    .await
                    .map_err(|e| e.to_string());
                if msg_tx
                    .send(Message::HoverInfoFetched {
                        session_id,
                        request_id,
                        result,
                    })
                    .is_err()
                {
                    trace!("Engine gone before hover fetch {} completed", request_id);
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptedFetcher;

    #[tokio::test(start_paused = true)]
    async fn test_timer_reports_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let fetcher = Arc::new(ScriptedFetcher::default());
        handle_action(
            UpdateAction::ScheduleHoverTimer {
                session_id: 1,
                request_id: 3,
                delay: Duration::from_millis(200),
            },
            tx,
            fetcher.clone(),
        );

        tokio::time::sleep(Duration::from_millis(199)).await;
        assert!(rx.try_recv().is_err());

        let msg = rx.recv().await.unwrap();
        assert!(matches!(
            msg,
            Message::HoverTimerFired {
                session_id: 1,
                request_id: 3
            }
        ));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_reported_as_text() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let fetcher = Arc::new(ScriptedFetcher::default().fail_on("L9", "no such element"));
        handle_action(
            UpdateAction::FetchHoverInfo {
                session_id: 2,
                request_id: 5,
                request: HoverInfoRequest::new("L9", "LINE"),
            },
            tx,
            fetcher.clone(),
        );

        match rx.recv().await.unwrap() {
            Message::HoverInfoFetched {
                session_id,
                request_id,
                result,
            } => {
                assert_eq!((session_id, request_id), (2, 5));
                assert!(result.unwrap_err().contains("no such element"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(fetcher.calls(), 1);
    }
}
