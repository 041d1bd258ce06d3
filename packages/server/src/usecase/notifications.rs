//! UseCase: 通知管理処理
//!
//! 通知の一覧取得・既読化（単体／一括）・削除と、レビュー投稿を契機とした
//! 通知作成を担います。すべての操作で呼び出し元の ID が `recipient` と
//! 一致することを要求し、他人の通知への操作は「存在するがあなたのものでは
//! ない」として not-found とは区別された認可エラーで拒否します。

use std::sync::Arc;

use shitei_shared::time::get_utc_timestamp;

use crate::domain::{
    MessagePusher, Notification, NotificationId, NotificationKind, NotificationRepository,
    Timestamp, UserId,
};

use super::error::UseCaseError;

/// レビュー投稿を契機に作成された通知
#[derive(Debug, Clone)]
pub struct ReviewNotificationOutcome {
    pub notification: Notification,
    /// メンターがライブ接続を持っていたか（true なら `new_notification` を配信）
    pub mentor_online: bool,
}

/// 通知管理のユースケース
pub struct NotificationsUseCase {
    /// Repository（通知ストアの抽象化）
    notification_repository: Arc<dyn NotificationRepository>,
    /// MessagePusher（コネクションレジストリの抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl NotificationsUseCase {
    /// 新しい NotificationsUseCase を作成
    pub fn new(
        notification_repository: Arc<dyn NotificationRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            notification_repository,
            message_pusher,
        }
    }

    /// 受信者の通知一覧を作成日時の降順で取得
    pub async fn list(&self, recipient: &UserId) -> Result<Vec<Notification>, UseCaseError> {
        Ok(self.notification_repository.list_for(recipient).await?)
    }

    /// 通知を既読化（呼び出し元が受信者であることを要求）
    pub async fn mark_read(
        &self,
        id: &str,
        caller: &UserId,
    ) -> Result<(), UseCaseError> {
        let id = self.resolve_owned(id, caller).await?;
        self.notification_repository.mark_read(&id).await?;
        Ok(())
    }

    /// 呼び出し元の全通知を一括既読化（変更した件数を返す）
    pub async fn mark_all_read(&self, caller: &UserId) -> Result<u64, UseCaseError> {
        Ok(self.notification_repository.mark_all_read(caller).await?)
    }

    /// 通知を削除（呼び出し元が受信者であることを要求）
    pub async fn delete(&self, id: &str, caller: &UserId) -> Result<(), UseCaseError> {
        let id = self.resolve_owned(id, caller).await?;
        self.notification_repository.delete(&id).await?;
        Ok(())
    }

    /// レビュー投稿を契機にメンターへの通知を作成
    ///
    /// レビュー CRUD 自体は外部コラボレータであり、このコアへの唯一の影響が
    /// この通知作成です。`related_id` はレビュー ID を指します。
    pub async fn create_review_notification(
        &self,
        mentor_id: UserId,
        student_id: UserId,
        review_id: String,
    ) -> Result<ReviewNotificationOutcome, UseCaseError> {
        let notification = Notification::new(
            mentor_id.clone(),
            student_id,
            NotificationKind::Review,
            "New review received".to_string(),
            "A student has left a review on your profile.".to_string(),
            Some(review_id),
            Timestamp::new(get_utc_timestamp()),
        );
        self.notification_repository
            .insert(notification.clone())
            .await?;

        let mentor_online = self.message_pusher.is_online(&mentor_id).await;
        Ok(ReviewNotificationOutcome {
            notification,
            mentor_online,
        })
    }

    /// ID をパースし、通知が存在して呼び出し元のものであることを確認する
    ///
    /// 「存在しない」（not-found）と「存在するが他人のもの」（認可エラー）を
    /// 区別して返します。
    async fn resolve_owned(
        &self,
        id: &str,
        caller: &UserId,
    ) -> Result<NotificationId, UseCaseError> {
        let id = NotificationId::parse(id)
            .map_err(|_| UseCaseError::NotificationNotFound(id.to_string()))?;
        let notification = self
            .notification_repository
            .find_by_id(&id)
            .await?
            .ok_or_else(|| UseCaseError::NotificationNotFound(id.to_string()))?;
        if notification.recipient != *caller {
            return Err(UseCaseError::NotificationOwnerMismatch);
        }
        Ok(id)
    }
}
