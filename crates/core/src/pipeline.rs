//! 파이프라인 trait -- 분석 패스의 확장 포인트 정의
//!
//! 한 번의 분석 패스는 다음 순서로 흐릅니다.
//!
//! ```text
//! LogSource ─▶ Normalizer ─▶ Detector × N ─▶ EventStore ─▶ NotificationChannel × M
//! ```
//!
//! 백엔드별 차이는 [`LogSource`]와 [`Normalizer`]에만 존재하고,
//! [`Detector`]는 정규화된 [`AccessLogEntry`]만 다룹니다.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::config::Thresholds;
use crate::error::{ChannelError, IngestionError, NormalizeError, StoreError};
use crate::types::{AccessLogEntry, EventType, SecurityEvent, TimeRange};

/// `Send` 가능한 boxed future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 접근 로그 정규화 trait
///
/// 새로운 백엔드 로그 형식을 지원하려면 이 trait을 구현합니다.
pub trait Normalizer: Send + Sync {
    /// 지원하는 형식 이름
    fn format_name(&self) -> &str;

    /// 원시 레코드 하나를 정규화합니다.
    fn normalize(&self, raw: &[u8]) -> Result<AccessLogEntry, NormalizeError>;
}

/// 패턴 탐지기 trait
///
/// 탐지기는 순수 함수입니다. I/O도, 공유 가변 상태도 없고
/// 같은 배치에는 항상 같은 결과를 돌려줍니다.
pub trait Detector: Send + Sync {
    /// 이 탐지기가 생성하는 이벤트 종류
    fn event_type(&self) -> EventType;

    /// 분석 창 전체 배치를 검사합니다.
    fn detect(&self, entries: &[AccessLogEntry], thresholds: &Thresholds) -> Vec<SecurityEvent>;
}

/// 접근 로그 소스 trait
pub trait LogSource: Send + Sync {
    /// 소스 이름 (로그/에러 메시지용)
    fn name(&self) -> &str;

    /// 분석 창에 속한 정규화 엔트리를 가져옵니다.
    ///
    /// 소스 자체에 접근할 수 없으면 [`IngestionError`]를 반환합니다.
    /// 손상된 개별 레코드는 에러가 아니라 건너뜁니다.
    fn fetch(
        &self,
        window: &TimeRange,
    ) -> impl Future<Output = Result<Vec<AccessLogEntry>, IngestionError>> + Send;
}

/// 저장소에 기록되는 이벤트 레코드
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    /// 결정적 이벤트 식별자
    pub id: String,
    /// 이벤트 본문
    pub event: SecurityEvent,
}

/// 이벤트 키-값 저장소 trait
///
/// 조건부 쓰기(`put_if_absent`)를 원자적으로 수행해야 합니다.
/// 같은 키에 대한 동시 쓰기 중 정확히 하나만 `true`를 받습니다.
pub trait EventStore: Send + Sync {
    /// 키가 없을 때만 저장합니다. 저장했으면 `true`.
    fn put_if_absent(
        &self,
        record: StoredEvent,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// 타임스탬프가 범위 안에 있는 레코드를 순서 보장 없이 반환합니다.
    fn scan(
        &self,
        range: &TimeRange,
    ) -> impl Future<Output = Result<Vec<StoredEvent>, StoreError>> + Send;
}

/// 알림 채널 trait
pub trait NotificationChannel: Send + Sync {
    /// 채널 이름 (slack, email 등)
    fn name(&self) -> &str;

    /// 전송에 필요한 설정이 갖춰졌는지 여부
    ///
    /// `false`인 채널은 디스패처가 건너뜁니다.
    fn is_configured(&self) -> bool;

    /// 알림 하나를 전송합니다.
    fn send(
        &self,
        subject: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), ChannelError>> + Send;
}

/// dyn-compatible 알림 채널 trait
///
/// `NotificationChannel`은 RPITIT를 사용하므로 `dyn NotificationChannel`이 불가합니다.
/// `DynNotificationChannel`은 `BoxFuture`를 반환하여
/// `Vec<Arc<dyn DynNotificationChannel>>`으로 채널을 동적 관리할 수 있게 합니다.
pub trait DynNotificationChannel: Send + Sync {
    /// 채널 이름
    fn name(&self) -> &str;

    /// 설정 완료 여부
    fn is_configured(&self) -> bool;

    /// 알림 하나를 전송합니다.
    fn send<'a>(&'a self, subject: &'a str, body: &'a str) -> BoxFuture<'a, Result<(), ChannelError>>;
}

/// NotificationChannel을 구현한 타입은 자동으로 DynNotificationChannel도 구현됩니다.
impl<T: NotificationChannel> DynNotificationChannel for T {
    fn name(&self) -> &str {
        NotificationChannel::name(self)
    }

    fn is_configured(&self) -> bool {
        NotificationChannel::is_configured(self)
    }

    fn send<'a>(&'a self, subject: &'a str, body: &'a str) -> BoxFuture<'a, Result<(), ChannelError>> {
        Box::pin(NotificationChannel::send(self, subject, body))
    }
}
