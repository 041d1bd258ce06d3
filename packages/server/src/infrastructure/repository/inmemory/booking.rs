//! InMemory Booking Repository 実装

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Booking, BookingRepository, MessageId, RepositoryError, RoomId};

/// インメモリ Booking Repository 実装
pub struct InMemoryBookingRepository {
    /// ブッキングレコード（挿入順）
    bookings: Arc<Mutex<Vec<Booking>>>,
}

impl InMemoryBookingRepository {
    /// 新しい InMemoryBookingRepository を作成
    pub fn new() -> Self {
        Self {
            bookings: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Default for InMemoryBookingRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn insert(&self, booking: Booking) -> Result<(), RepositoryError> {
        let mut bookings = self.bookings.lock().await;
        bookings.push(booking);
        Ok(())
    }

    async fn find_by_message_id(
        &self,
        message_id: &MessageId,
    ) -> Result<Option<Booking>, RepositoryError> {
        let bookings = self.bookings.lock().await;
        Ok(bookings
            .iter()
            .find(|b| b.message_id == *message_id)
            .cloned())
    }

    async fn update(&self, booking: &Booking) -> Result<(), RepositoryError> {
        let mut bookings = self.bookings.lock().await;
        match bookings.iter_mut().find(|b| b.id == booking.id) {
            Some(stored) => {
                *stored = booking.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn delete_by_room(&self, room_id: &RoomId) -> Result<u64, RepositoryError> {
        let mut bookings = self.bookings.lock().await;
        let before = bookings.len();
        bookings.retain(|b| b.room_id != *room_id);
        Ok((before - bookings.len()) as u64)
    }
}
