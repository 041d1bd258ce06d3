//! SQLite Booking Repository 実装

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::{Booking, BookingRepository, MessageId, RepositoryError, RoomId};

use super::{map_sqlx_err, row::BookingRow};

/// SQLite Booking Repository 実装
pub struct SqliteBookingRepository {
    pool: SqlitePool,
}

impl SqliteBookingRepository {
    /// 新しい SqliteBookingRepository を作成
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepository {
    async fn insert(&self, booking: Booking) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO bookings \
             (id, message_id, room_id, student_id, mentor_id, topic, date, time, \
              duration_minutes, status, meeting_link) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(booking.id.to_string())
        .bind(booking.message_id.to_string())
        .bind(booking.room_id.as_str())
        .bind(booking.student_id.as_str())
        .bind(booking.mentor_id.as_str())
        .bind(&booking.topic)
        .bind(&booking.date)
        .bind(&booking.time)
        .bind(booking.duration_minutes as i64)
        .bind(booking.status.as_str())
        .bind(booking.meeting_link.as_ref().map(|l| l.as_str().to_string()))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn find_by_message_id(
        &self,
        message_id: &MessageId,
    ) -> Result<Option<Booking>, RepositoryError> {
        let row: Option<BookingRow> =
            sqlx::query_as("SELECT * FROM bookings WHERE message_id = ?")
                .bind(message_id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_err)?;
        row.map(Booking::try_from).transpose()
    }

    async fn update(&self, booking: &Booking) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE bookings SET status = ?, meeting_link = ? WHERE id = ?",
        )
        .bind(booking.status.as_str())
        .bind(booking.meeting_link.as_ref().map(|l| l.as_str().to_string()))
        .bind(booking.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_by_room(&self, room_id: &RoomId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM bookings WHERE room_id = ?")
            .bind(room_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(result.rows_affected())
    }
}
