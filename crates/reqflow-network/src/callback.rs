//! 콜백 전달 컨텍스트.
//!
//! 성공/실패 콜백은 요청 워커가 아니라 호출자가 예측할 수 있는 단일 실행 컨텍스트에서
//! 순서대로 실행된다. 전용 태스크를 띄우거나(`spawn`), 호출자가 직접 수신기를
//! 자기 루프에서 비운다(`channel`).

use std::panic::{catch_unwind, AssertUnwindSafe};
use tokio::sync::mpsc;
use tracing::{error, warn};

type Callback = Box<dyn FnOnce() + Send + 'static>;

/// 콜백을 게시하는 쪽 (복제 가능)
#[derive(Clone)]
pub struct CallbackContext {
    tx: mpsc::UnboundedSender<Callback>,
}

impl CallbackContext {
    /// 전용 태스크에서 콜백을 순서대로 실행하는 컨텍스트
    ///
    /// tokio 런타임 안에서 호출해야 한다.
    pub fn spawn() -> Self {
        let (ctx, receiver) = Self::channel();
        tokio::spawn(receiver.run());
        ctx
    }

    /// 호출자가 직접 수신기를 비우는 컨텍스트
    pub fn channel() -> (Self, CallbackReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, CallbackReceiver { rx })
    }

    /// 콜백 게시. 수신기가 닫혔으면 `false`.
    pub(crate) fn post<F>(&self, callback: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if self.tx.send(Box::new(callback)).is_err() {
            warn!("콜백 컨텍스트가 닫혀 콜백을 전달하지 못함");
            return false;
        }
        true
    }

    /// 수신기가 닫혔는지 여부
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl std::fmt::Debug for CallbackContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackContext")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// 콜백을 실행하는 쪽
pub struct CallbackReceiver {
    rx: mpsc::UnboundedReceiver<Callback>,
}

impl CallbackReceiver {
    /// 다음 콜백을 기다려 실행. 모든 게시자가 사라지면 `false`.
    pub async fn run_next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(callback) => {
                invoke(callback);
                true
            }
            None => false,
        }
    }

    /// 이미 도착한 콜백만 실행하고 실행한 수를 반환
    pub fn run_pending(&mut self) -> usize {
        let mut count = 0;
        while let Ok(callback) = self.rx.try_recv() {
            invoke(callback);
            count += 1;
        }
        count
    }

    /// 모든 게시자가 사라질 때까지 실행
    pub async fn run(mut self) {
        while self.run_next().await {}
    }
}

fn invoke(callback: Callback) {
    if catch_unwind(AssertUnwindSafe(callback)).is_err() {
        error!("요청 콜백 실행 중 패닉 발생, 무시");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn channel_runs_in_posting_order() {
        let (ctx, mut receiver) = CallbackContext::channel();
        let log = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let log = log.clone();
            assert!(ctx.post(move || log.lock().push(i)));
        }

        assert_eq!(receiver.run_pending(), 3);
        assert_eq!(*log.lock(), vec![0, 1, 2]);
        assert_eq!(receiver.run_pending(), 0);
    }

    #[test]
    fn post_after_receiver_dropped_fails() {
        let (ctx, receiver) = CallbackContext::channel();
        drop(receiver);
        assert!(ctx.is_closed());
        assert!(!ctx.post(|| {}));
    }

    #[test]
    fn panicking_callback_does_not_stop_receiver() {
        let (ctx, mut receiver) = CallbackContext::channel();
        let ran = Arc::new(Mutex::new(false));
        let flag = ran.clone();

        ctx.post(|| panic!("callback failure"));
        ctx.post(move || *flag.lock() = true);

        assert_eq!(receiver.run_pending(), 2);
        assert!(*ran.lock());
    }

    #[tokio::test]
    async fn spawned_context_runs_callbacks() {
        let ctx = CallbackContext::spawn();
        let (tx, rx) = tokio::sync::oneshot::channel();

        ctx.post(move || {
            let _ = tx.send(42);
        });

        assert_eq!(rx.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn run_next_returns_false_when_all_senders_gone() {
        let (ctx, mut receiver) = CallbackContext::channel();
        ctx.post(|| {});
        drop(ctx);

        assert!(receiver.run_next().await);
        assert!(!receiver.run_next().await);
    }
}
