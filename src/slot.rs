use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

struct Shared<T> {
    latest: Mutex<Option<(u64, T)>>,
    generation: AtomicU64,
}

/// 生産者側
pub struct SlotSender<T> {
    shared: Arc<Shared<T>>,
}

/// 消費者側
pub struct SlotReceiver<T> {
    shared: Arc<Shared<T>>,
    seen: u64,
}

/// 1要素のスロットを作成
///
/// 生産者はブロックせず、未取得の値は上書きされる。
/// 消費者は値を読み飛ばすことはあっても古い値に戻ることはない。
pub fn latest_slot<T>() -> (SlotSender<T>, SlotReceiver<T>) {
    let shared = Arc::new(Shared {
        latest: Mutex::new(None),
        generation: AtomicU64::new(0),
    });
    (
        SlotSender {
            shared: shared.clone(),
        },
        SlotReceiver { shared, seen: 0 },
    )
}

impl<T> SlotSender<T> {
    /// 値を公開。未取得の古い値は上書きされる。
    pub fn publish(&self, value: T) {
        let mut latest = self
            .shared
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let generation = self.shared.generation.load(Ordering::Relaxed) + 1;
        *latest = Some((generation, value));
        self.shared.generation.store(generation, Ordering::Release);
    }
}

impl<T> SlotReceiver<T> {
    /// 前回以降に公開された値があるか（ロックしない）
    pub fn has_update(&self) -> bool {
        self.shared.generation.load(Ordering::Acquire) > self.seen
    }

    /// 最新の値を取り出す。新しい値がなければ None。
    pub fn take(&mut self) -> Option<T> {
        if !self.has_update() {
            return None;
        }

        let mut latest = self
            .shared
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (generation, value) = latest.take()?;
        self.seen = generation;
        Some(value)
    }
}
