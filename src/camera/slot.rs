use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::tracker::Rotation;

/// カメラから届いた1フレームと、その向きの情報
#[derive(Debug, Clone)]
pub struct CameraFrame<I> {
    pub image: I,
    pub rotation: Rotation,
    pub front_facing: bool,
}

impl<I> CameraFrame<I> {
    pub fn new(image: I, rotation: Rotation, front_facing: bool) -> Self {
        Self {
            image,
            rotation,
            front_facing,
        }
    }
}

/// 最新フレームだけを保持する受け渡し口
///
/// 書き込み側はブロックせず上書きする。読み出し側が処理中に届いた
/// フレームは次の上書きで消える（キューイングしない）。
pub struct FrameSlot<T> {
    latest: Arc<Mutex<Option<T>>>,
    frame_id: Arc<AtomicU64>,
}

impl<T> Clone for FrameSlot<T> {
    fn clone(&self) -> Self {
        Self {
            latest: Arc::clone(&self.latest),
            frame_id: Arc::clone(&self.frame_id),
        }
    }
}

impl<T> Default for FrameSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FrameSlot<T> {
    pub fn new() -> Self {
        Self {
            latest: Arc::new(Mutex::new(None)),
            frame_id: Arc::new(AtomicU64::new(0)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        // 書き込み側がパニックしてもフレーム自体は読める
        self.latest.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 新しいフレームで上書きする
    pub fn publish(&self, frame: T) {
        let mut guard = self.lock();
        *guard = Some(frame);
        self.frame_id.fetch_add(1, Ordering::Release);
    }

    /// 現在のフレームID。新フレームが届くたびに増える。0 は未着
    pub fn frame_id(&self) -> u64 {
        self.frame_id.load(Ordering::Acquire)
    }
}

impl<T: Clone> FrameSlot<T> {
    /// `seen` より新しいフレームがあれば返す
    pub fn latest_since(&self, seen: u64) -> Option<(u64, T)> {
        let guard = self.lock();
        let id = self.frame_id();
        if id == seen {
            return None;
        }
        guard.as_ref().map(|frame| (id, frame.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_slot() {
        let slot: FrameSlot<u32> = FrameSlot::new();
        assert_eq!(slot.frame_id(), 0);
        assert!(slot.latest_since(0).is_none());
    }

    #[test]
    fn test_keeps_only_latest() {
        let slot = FrameSlot::new();
        slot.publish(1u32);
        slot.publish(2u32);
        slot.publish(3u32);
        assert_eq!(slot.latest_since(0), Some((3, 3)));
    }

    #[test]
    fn test_latest_since() {
        let slot = FrameSlot::new();
        slot.publish("a");
        let (id, frame) = slot.latest_since(0).unwrap();
        assert_eq!(frame, "a");
        assert!(slot.latest_since(id).is_none());
        slot.publish("b");
        assert_eq!(slot.latest_since(id), Some((id + 1, "b")));
    }

    #[test]
    fn test_clone_shares_storage() {
        let writer = FrameSlot::new();
        let reader = writer.clone();
        let handle = std::thread::spawn(move || {
            for i in 0..100u32 {
                writer.publish(i);
            }
        });
        handle.join().unwrap();
        assert_eq!(reader.latest_since(0), Some((100, 99)));
    }
}
