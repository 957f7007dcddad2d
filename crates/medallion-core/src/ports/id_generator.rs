//! IdGenerator port - ID 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）

use crate::domain::AttemptId;
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は実行ごとの AttemptId を生成
///
/// `Send + Sync` を要求（PipelineGraph を複数タスクから共有するため）
pub trait IdGenerator: Send + Sync {
    fn generate_attempt_id(&self) -> AttemptId;
}

/// UlidGenerator は Clock の時刻をタイムスタンプ部に使う
///
/// FixedClock を渡せばタイムスタンプ部が決定的になる。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    /// 新しい UlidGenerator を作成
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_attempt_id(&self) -> AttemptId {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        AttemptId::from(ulid)
    }
}
