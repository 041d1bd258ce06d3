//! ブッキング（メンタリングセッション予約）のエンティティとステートマシン
//!
//! ブッキングはチャットメッセージに埋め込まれるのではなく、メッセージ ID から
//! 参照される第一級のレコードです。状態遷移はこのエンティティのメソッドだけが
//! 実行でき、遷移の検証（現在状態・実行者の権限・ペイロードの妥当性）は
//! 永続化の前に完了します。
//!
//! 状態遷移図:
//!
//! ```text
//! pending --> accepted --> completed
//!    |
//!    +------> declined
//! ```
//!
//! `declined` と `completed` は終端状態であり、以降のあらゆる遷移は拒否されます。

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{error::DomainError, message::MessageId, room::RoomId, user::UserId};

/// ブッキング ID の値オブジェクト（UUID v4）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BookingId(Uuid);

impl BookingId {
    /// 新しいブッキング ID を生成
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// 文字列からパース
    pub fn parse(value: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(value)?))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ブッキングの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Declined,
    Completed,
}

impl BookingStatus {
    /// 終端状態（以降の遷移が存在しない）かどうか
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Declined | BookingStatus::Completed)
    }

    /// この状態から `next` への遷移が許可されているか
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Accepted)
                | (BookingStatus::Pending, BookingStatus::Declined)
                | (BookingStatus::Accepted, BookingStatus::Completed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Declined => "declined",
            BookingStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// ミーティングリンクの値オブジェクト
///
/// `accepted` への遷移時にのみ設定され、`http://` または `https://` で
/// 始まる絶対 URL であることを要求します。検証済みの文字列はそのまま
/// （verbatim）保存されます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingLink(String);

impl MeetingLink {
    /// 新しい MeetingLink を作成
    ///
    /// # Errors
    ///
    /// `http://` / `https://` で始まらない場合はエラー
    pub fn parse(value: String) -> Result<Self, DomainError> {
        if value.starts_with("http://") || value.starts_with("https://") {
            Ok(Self(value))
        } else {
            Err(DomainError::InvalidMeetingLink(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// ブッキング作成時の入力
///
/// `duration_minutes` は UI 側で時間＋分に分解された入力から合成されます
/// （`BookingDraft::duration_from_parts` を参照）。
#[derive(Debug, Clone)]
pub struct BookingDraft {
    pub topic: String,
    /// カレンダー日付（タイムゾーンなしのプレーン文字列、例: "2025-06-01"）
    pub date: String,
    /// 開始時刻（タイムゾーンなしのプレーン文字列、例: "14:00"）
    pub time: String,
    pub duration_minutes: u32,
}

impl BookingDraft {
    /// 時間と分に分解された入力からセッション長（分）を合成
    pub fn duration_from_parts(hours: u32, minutes: u32) -> u32 {
        hours * 60 + minutes
    }
}

/// 提案された／確定したメンタリングセッション
///
/// 学生（提案者）とメンター（相手方）を明示的なフィールドとして保持します。
/// 「どちらが相手方か」をルーム ID の文字列操作で復元することはありません。
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub id: BookingId,
    /// ブッキングカードとして送信された元メッセージ（ブロードキャストのキー）
    pub message_id: MessageId,
    pub room_id: RoomId,
    /// 提案者。このドメインではセッション要求を起こせるのは学生のみ
    pub student_id: UserId,
    /// 相手方。すべての状態遷移はメンターだけが実行できる
    pub mentor_id: UserId,
    pub topic: String,
    pub date: String,
    pub time: String,
    pub duration_minutes: u32,
    pub status: BookingStatus,
    pub meeting_link: Option<MeetingLink>,
}

impl Booking {
    /// 新しいブッキングを `pending` 状態で作成
    ///
    /// # Errors
    ///
    /// トピックが空、またはセッション長が 0 分の場合はエラー
    pub fn propose(
        message_id: MessageId,
        room_id: RoomId,
        student_id: UserId,
        mentor_id: UserId,
        draft: BookingDraft,
    ) -> Result<Self, DomainError> {
        if draft.topic.trim().is_empty() {
            return Err(DomainError::EmptyTopic);
        }
        if draft.duration_minutes == 0 {
            return Err(DomainError::InvalidDuration);
        }
        Ok(Self {
            id: BookingId::generate(),
            message_id,
            room_id,
            student_id,
            mentor_id,
            topic: draft.topic,
            date: draft.date,
            time: draft.time,
            duration_minutes: draft.duration_minutes,
            status: BookingStatus::Pending,
            meeting_link: None,
        })
    }

    /// `pending` → `accepted`
    ///
    /// 相手方（メンター）のみが実行でき、検証済みのミーティングリンクを
    /// 必要とします。リンクは遷移と同時に設定されます。
    pub fn accept(&mut self, actor: &UserId, link: MeetingLink) -> Result<(), DomainError> {
        self.ensure_counterparty(actor)?;
        self.ensure_transition(BookingStatus::Accepted)?;
        self.status = BookingStatus::Accepted;
        self.meeting_link = Some(link);
        Ok(())
    }

    /// `pending` → `declined`（不可逆）
    pub fn decline(&mut self, actor: &UserId) -> Result<(), DomainError> {
        self.ensure_counterparty(actor)?;
        self.ensure_transition(BookingStatus::Declined)?;
        self.status = BookingStatus::Declined;
        Ok(())
    }

    /// `accepted` → `completed`（不可逆）
    ///
    /// 通知チャンネルの副作用（お礼メッセージの合成と学生への通知）は
    /// UseCase 層が担います。
    pub fn complete(&mut self, actor: &UserId) -> Result<(), DomainError> {
        self.ensure_counterparty(actor)?;
        self.ensure_transition(BookingStatus::Completed)?;
        self.status = BookingStatus::Completed;
        Ok(())
    }

    fn ensure_counterparty(&self, actor: &UserId) -> Result<(), DomainError> {
        if actor != &self.mentor_id {
            return Err(DomainError::NotCounterparty);
        }
        Ok(())
    }

    fn ensure_transition(&self, next: BookingStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn draft(topic: &str, duration: u32) -> BookingDraft {
        BookingDraft {
            topic: topic.to_string(),
            date: "2025-06-01".to_string(),
            time: "14:00".to_string(),
            duration_minutes: duration,
        }
    }

    fn pending_booking() -> Booking {
        let student = user("alice");
        let mentor = user("bob");
        Booking::propose(
            MessageId::generate(),
            RoomId::direct(&student, &mentor),
            student,
            mentor,
            draft("Resume review", 30),
        )
        .unwrap()
    }

    #[test]
    fn test_propose_starts_pending_without_link() {
        // テスト項目: 作成直後のブッキングは pending でリンクを持たない
        // given (前提条件) / when (操作):
        let booking = pending_booking();

        // then (期待する結果):
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.meeting_link, None);
        assert_eq!(booking.topic, "Resume review");
        assert_eq!(booking.duration_minutes, 30);
    }

    #[test]
    fn test_propose_rejects_empty_topic_and_zero_duration() {
        // テスト項目: 空トピックと 0 分のセッション長が拒否される
        // given (前提条件):
        let student = user("alice");
        let mentor = user("bob");
        let room = RoomId::direct(&student, &mentor);

        // when (操作):
        let empty_topic = Booking::propose(
            MessageId::generate(),
            room.clone(),
            student.clone(),
            mentor.clone(),
            draft("   ", 30),
        );
        let zero_duration = Booking::propose(
            MessageId::generate(),
            room,
            student,
            mentor,
            draft("Resume review", 0),
        );

        // then (期待する結果):
        assert_eq!(empty_topic.unwrap_err(), DomainError::EmptyTopic);
        assert_eq!(zero_duration.unwrap_err(), DomainError::InvalidDuration);
    }

    #[test]
    fn test_duration_from_parts() {
        // テスト項目: 時間＋分の分解入力から分単位のセッション長が合成される
        assert_eq!(BookingDraft::duration_from_parts(1, 30), 90);
        assert_eq!(BookingDraft::duration_from_parts(0, 45), 45);
    }

    #[test]
    fn test_accept_requires_valid_link() {
        // テスト項目: accepted への遷移は http(s) リンクを要求し、リンクは verbatim に保存される
        // given (前提条件):
        let mut booking = pending_booking();
        let mentor = user("bob");

        // when (操作): 不正なスキームのリンク
        let bad_link = MeetingLink::parse("ftp://x".to_string());

        // then (期待する結果):
        assert!(matches!(bad_link, Err(DomainError::InvalidMeetingLink(_))));

        // when (操作): 正当なリンクで accept
        let link = MeetingLink::parse("https://meet.google.com/abc".to_string()).unwrap();
        booking.accept(&mentor, link).unwrap();

        // then (期待する結果):
        assert_eq!(booking.status, BookingStatus::Accepted);
        assert_eq!(
            booking.meeting_link.as_ref().unwrap().as_str(),
            "https://meet.google.com/abc"
        );
    }

    #[test]
    fn test_only_counterparty_may_transition() {
        // テスト項目: 提案者（学生）や第三者による遷移が認可エラーになる
        // given (前提条件):
        let mut booking = pending_booking();
        let student = user("alice");
        let stranger = user("mallory");
        let link = MeetingLink::parse("https://meet.example.com/x".to_string()).unwrap();

        // when (操作) / then (期待する結果):
        assert_eq!(
            booking.accept(&student, link.clone()).unwrap_err(),
            DomainError::NotCounterparty
        );
        assert_eq!(
            booking.accept(&stranger, link).unwrap_err(),
            DomainError::NotCounterparty
        );
        assert_eq!(
            booking.decline(&student).unwrap_err(),
            DomainError::NotCounterparty
        );
        // 状態は変わっていない
        assert_eq!(booking.status, BookingStatus::Pending);
    }

    #[test]
    fn test_status_monotonicity() {
        // テスト項目: 観測される状態系列が pending→accepted→completed または
        //             pending→declined の接頭辞に限られる（単調性）
        // given (前提条件):
        let mentor = user("bob");
        let link = MeetingLink::parse("https://meet.example.com/x".to_string()).unwrap();

        // when (操作): pending → accepted → completed
        let mut booking = pending_booking();
        booking.accept(&mentor, link.clone()).unwrap();
        booking.complete(&mentor).unwrap();

        // then (期待する結果): completed は終端、いかなる遷移も拒否される
        assert!(booking.status.is_terminal());
        assert!(matches!(
            booking.accept(&mentor, link.clone()),
            Err(DomainError::InvalidTransition { .. })
        ));
        assert!(matches!(
            booking.decline(&mentor),
            Err(DomainError::InvalidTransition { .. })
        ));
        assert!(matches!(
            booking.complete(&mentor),
            Err(DomainError::InvalidTransition { .. })
        ));

        // when (操作): pending → declined
        let mut declined = pending_booking();
        declined.decline(&mentor).unwrap();

        // then (期待する結果): declined も終端
        assert!(declined.status.is_terminal());
        assert!(matches!(
            declined.accept(&mentor, link),
            Err(DomainError::InvalidTransition { .. })
        ));
        assert!(matches!(
            declined.complete(&mentor),
            Err(DomainError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_complete_requires_accepted() {
        // テスト項目: pending からの complete が拒否される（accepted を経由する必要がある）
        // given (前提条件):
        let mut booking = pending_booking();
        let mentor = user("bob");

        // when (操作):
        let result = booking.complete(&mentor);

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            DomainError::InvalidTransition {
                from: BookingStatus::Pending,
                to: BookingStatus::Completed,
            }
        );
        assert_eq!(booking.status, BookingStatus::Pending);
    }
}
