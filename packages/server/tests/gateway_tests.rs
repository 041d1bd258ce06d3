//! End-to-end gateway tests.
//!
//! Spawns the real server (in-memory repositories) and drives it over live
//! WebSocket connections and REST calls, covering the full booking
//! negotiation scenario: propose → accept → complete, with the completion
//! side effects (system thank-you message, student notification).

use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite};

use shitei_server::infrastructure::dto::websocket::ServerEvent;
use shitei_server::infrastructure::message_pusher::WebSocketMessagePusher;
use shitei_server::infrastructure::repository::{
    InMemoryBookingRepository, InMemoryMessageRepository, InMemoryNotificationRepository,
};
use shitei_server::ui::{Server, state::AppState};
use shitei_server::usecase::{
    DeleteConversationUseCase, DisconnectUseCase, GetChatHistoryUseCase,
    GetConversationsUseCase, JoinChatUseCase, MarkMessagesReadUseCase, NotificationsUseCase,
    RegisterUserUseCase, SendMessageUseCase, UpdateBookingStatusUseCase,
};

/// Counter handing out unique ports per test
static NEXT_PORT: AtomicU16 = AtomicU16::new(18900);

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Start a test server with in-memory repositories on a unique port.
async fn start_test_server() -> u16 {
    let port = NEXT_PORT.fetch_add(1, Ordering::SeqCst);

    let messages = Arc::new(InMemoryMessageRepository::new());
    let bookings = Arc::new(InMemoryBookingRepository::new());
    let notifications = Arc::new(InMemoryNotificationRepository::new());
    let message_pusher = Arc::new(WebSocketMessagePusher::new());

    let get_chat_history_usecase = Arc::new(GetChatHistoryUseCase::new(
        messages.clone(),
        bookings.clone(),
    ));
    let state = AppState {
        register_user_usecase: Arc::new(RegisterUserUseCase::new(message_pusher.clone())),
        disconnect_usecase: Arc::new(DisconnectUseCase::new(message_pusher.clone())),
        join_chat_usecase: Arc::new(JoinChatUseCase::new(
            get_chat_history_usecase.clone(),
            message_pusher.clone(),
        )),
        send_message_usecase: Arc::new(SendMessageUseCase::new(
            messages.clone(),
            bookings.clone(),
            message_pusher.clone(),
        )),
        update_booking_status_usecase: Arc::new(UpdateBookingStatusUseCase::new(
            messages.clone(),
            bookings.clone(),
            notifications.clone(),
            message_pusher.clone(),
        )),
        mark_messages_read_usecase: Arc::new(MarkMessagesReadUseCase::new(messages.clone())),
        get_chat_history_usecase,
        get_conversations_usecase: Arc::new(GetConversationsUseCase::new(messages.clone())),
        delete_conversation_usecase: Arc::new(DeleteConversationUseCase::new(
            messages.clone(),
            bookings.clone(),
        )),
        notifications_usecase: Arc::new(NotificationsUseCase::new(
            notifications.clone(),
            message_pusher.clone(),
        )),
        message_pusher,
    };

    let server = Server::new(Arc::new(state));
    tokio::spawn(async move {
        let _ = server.run("127.0.0.1".to_string(), port).await;
    });

    // Wait until the health endpoint answers
    let client = reqwest::Client::new();
    for _ in 0..50 {
        if client
            .get(format!("http://127.0.0.1:{port}/api/health"))
            .send()
            .await
            .is_ok()
        {
            return port;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("server did not become ready on port {port}");
}

/// WebSocket test client speaking the gateway protocol.
struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    async fn connect(port: u16) -> Self {
        let (ws, _) = connect_async(format!("ws://127.0.0.1:{port}/ws"))
            .await
            .expect("failed to connect");
        Self { ws }
    }

    async fn send(&mut self, event: Value) {
        self.ws
            .send(tungstenite::Message::Text(event.to_string().into()))
            .await
            .expect("failed to send event");
    }

    /// Receive the next server event (ignoring non-text frames).
    async fn recv_event(&mut self) -> ServerEvent {
        loop {
            let msg = tokio::time::timeout(RECV_TIMEOUT, self.ws.next())
                .await
                .expect("timed out waiting for server event")
                .expect("connection closed")
                .expect("websocket error");
            if let tungstenite::Message::Text(text) = msg {
                return serde_json::from_str(text.as_str()).expect("unparsable server event");
            }
        }
    }

    /// Receive events until `pred` matches; returns the matched event and
    /// everything consumed before it.
    async fn recv_until<F>(&mut self, pred: F) -> (ServerEvent, Vec<ServerEvent>)
    where
        F: Fn(&ServerEvent) -> bool,
    {
        let mut skipped = Vec::new();
        loop {
            let event = self.recv_event().await;
            if pred(&event) {
                return (event, skipped);
            }
            skipped.push(event);
        }
    }

    async fn register(&mut self, user_id: &str, role: &str) {
        self.send(json!({"event": "register_user", "userId": user_id, "role": role}))
            .await;
        let (event, _) = self
            .recv_until(|e| matches!(e, ServerEvent::Ack { event, .. } if event == "register_user"))
            .await;
        assert_ack_ok(&event);
    }

    async fn join_chat(&mut self, mentor_id: &str, user_id: &str) -> Vec<ServerEvent> {
        self.send(json!({"event": "join_chat", "mentorId": mentor_id, "userId": user_id}))
            .await;
        let (history, skipped) = self
            .recv_until(|e| matches!(e, ServerEvent::ChatHistory { .. }))
            .await;
        let mut events = skipped;
        events.push(history);
        events
    }
}

fn assert_ack_ok(event: &ServerEvent) {
    match event {
        ServerEvent::Ack { ok, error, .. } => {
            assert!(*ok, "expected ok ack, got error: {error:?}");
        }
        other => panic!("expected ack, got {other:?}"),
    }
}

fn is_receive_message(event: &ServerEvent) -> bool {
    matches!(event, ServerEvent::ReceiveMessage { .. })
}

fn is_booking_updated(event: &ServerEvent) -> bool {
    matches!(event, ServerEvent::BookingUpdated { .. })
}

#[tokio::test]
async fn test_end_to_end_booking_negotiation() {
    // テスト項目: 提案 → 承認 → 完了の一連のフローと完了時の副作用
    // given (前提条件): 学生とメンターが接続・登録済み、学生がルームに参加
    let port = start_test_server().await;
    let mut student = TestClient::connect(port).await;
    let mut mentor = TestClient::connect(port).await;
    student.register("student-1", "user").await;
    mentor.register("mentor-1", "mentor").await;
    student.join_chat("mentor-1", "student-1").await;

    // when (操作): 学生がブッキングカードを送信
    student
        .send(json!({
            "event": "send_message",
            "mentorId": "mentor-1",
            "userId": "student-1",
            "type": "booking",
            "booking": {
                "topic": "Resume review",
                "date": "2025-06-01",
                "time": "14:00",
                "duration": 30
            },
            "timestamp": 1748786400000u64
        }))
        .await;

    // then (期待する結果): メンターは join_chat なしで receive_message を受信する
    // （学生の join_chat がメンターの接続を先回りして購読させている）
    let (event, _) = mentor.recv_until(is_receive_message).await;
    let message_id = match event {
        ServerEvent::ReceiveMessage { message } => {
            assert_eq!(message.sender_id, "student-1");
            let booking = message.booking.expect("booking card carries booking state");
            assert_eq!(booking.status.as_str(), "pending");
            assert_eq!(booking.topic, "Resume review");
            assert_eq!(booking.duration, 30);
            message.id
        }
        _ => unreachable!(),
    };

    // when (操作): メンターが承認（リンク付き）
    mentor
        .send(json!({
            "event": "update_booking_status",
            "messageId": message_id,
            "status": "accepted",
            "meetingLink": "https://meet.google.com/xyz"
        }))
        .await;

    // then (期待する結果): 両参加者に booking_updated が配信され、遷移後の状態を示す
    for client in [&mut student, &mut mentor] {
        let (event, _) = client.recv_until(is_booking_updated).await;
        match event {
            ServerEvent::BookingUpdated {
                message_id: updated_id,
                booking,
            } => {
                assert_eq!(updated_id, message_id);
                assert_eq!(booking.status.as_str(), "accepted");
                assert_eq!(
                    booking.meeting_link.as_deref(),
                    Some("https://meet.google.com/xyz")
                );
            }
            _ => unreachable!(),
        }
    }

    // when (操作): メンターが完了に遷移させる
    mentor
        .send(json!({
            "event": "update_booking_status",
            "messageId": message_id,
            "status": "completed"
        }))
        .await;

    // then (期待する結果): booking_updated (completed) とお礼メッセージがルームに流れる
    let (event, _) = student.recv_until(is_booking_updated).await;
    match event {
        ServerEvent::BookingUpdated { booking, .. } => {
            assert_eq!(booking.status.as_str(), "completed");
        }
        _ => unreachable!(),
    }
    let (event, _) = student.recv_until(is_receive_message).await;
    match &event {
        ServerEvent::ReceiveMessage { message } => {
            assert_eq!(message.sender_id, "mentor-1");
            assert_eq!(message.sender_role.as_str(), "system");
            assert!(message.text.contains("Resume review"));
        }
        _ => unreachable!(),
    }

    // 学生の個人チャンネルに new_notification が届く
    let (event, _) = student
        .recv_until(|e| matches!(e, ServerEvent::NewNotification { .. }))
        .await;
    match event {
        ServerEvent::NewNotification { notification } => {
            assert_eq!(notification.recipient, "student-1");
            assert_eq!(notification.sender, "mentor-1");
            assert_eq!(notification.kind.as_str(), "booking");
            assert_eq!(notification.related_id.as_deref(), Some("mentor-1"));
            assert!(!notification.is_read);
        }
        _ => unreachable!(),
    }

    // REST 履歴にも反映されている（ブッキングカード + お礼メッセージ）
    let client = reqwest::Client::new();
    let history: Value = client
        .get(format!("http://127.0.0.1:{port}/api/messages/mentor-1/student-1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history["success"], json!(true));
    let messages = history["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["type"], json!("booking"));
    assert_eq!(messages[0]["booking"]["status"], json!("completed"));
    assert_eq!(messages[1]["senderRole"], json!("system"));

    // 学生の通知一覧に未読の booking 通知が 1 件
    let notifications: Value = client
        .get(format!("http://127.0.0.1:{port}/api/notifications/student-1"))
        .header("X-User-Id", "student-1")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let listed = notifications["notifications"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["kind"], json!("booking"));
    assert_eq!(listed[0]["isRead"], json!(false));
}

#[tokio::test]
async fn test_booking_transition_rejections_are_acked() {
    // テスト項目: 不正リンク・提案者による遷移・終端状態への更新が ack で拒否される
    // given (前提条件): pending のブッキングが 1 件
    let port = start_test_server().await;
    let mut student = TestClient::connect(port).await;
    let mut mentor = TestClient::connect(port).await;
    student.register("student-1", "user").await;
    mentor.register("mentor-1", "mentor").await;
    student.join_chat("mentor-1", "student-1").await;

    student
        .send(json!({
            "event": "send_message",
            "mentorId": "mentor-1",
            "userId": "student-1",
            "type": "booking",
            "booking": {"topic": "Mock interview", "date": "2025-07-01", "time": "10:00", "duration": 60}
        }))
        .await;
    let (event, _) = mentor.recv_until(is_receive_message).await;
    let message_id = match event {
        ServerEvent::ReceiveMessage { message } => message.id,
        _ => unreachable!(),
    };

    // when (操作): ftp スキームのリンクで承認を試みる
    mentor
        .send(json!({
            "event": "update_booking_status",
            "messageId": message_id,
            "status": "accepted",
            "meetingLink": "ftp://x",
            "requestId": "req-1"
        }))
        .await;

    // then (期待する結果): validation エラーの ack（requestId がエコーされる）
    let (event, _) = mentor
        .recv_until(|e| matches!(e, ServerEvent::Ack { event, .. } if event == "update_booking_status"))
        .await;
    match event {
        ServerEvent::Ack {
            ok,
            error_kind,
            request_id,
            ..
        } => {
            assert!(!ok);
            assert_eq!(error_kind.as_deref(), Some("validation"));
            assert_eq!(request_id.as_deref(), Some("req-1"));
        }
        _ => unreachable!(),
    }

    // when (操作): 提案者（学生）が承認を試みる
    student
        .send(json!({
            "event": "update_booking_status",
            "messageId": message_id,
            "status": "accepted",
            "meetingLink": "https://meet.google.com/abc"
        }))
        .await;

    // then (期待する結果): unauthorized エラーの ack
    let (event, _) = student
        .recv_until(|e| matches!(e, ServerEvent::Ack { event, .. } if event == "update_booking_status"))
        .await;
    match event {
        ServerEvent::Ack { ok, error_kind, .. } => {
            assert!(!ok);
            assert_eq!(error_kind.as_deref(), Some("unauthorized"));
        }
        _ => unreachable!(),
    }

    // when (操作): メンターが辞退し、さらに更新を試みる
    mentor
        .send(json!({
            "event": "update_booking_status",
            "messageId": message_id,
            "status": "declined"
        }))
        .await;
    let (event, _) = mentor.recv_until(is_booking_updated).await;
    match event {
        ServerEvent::BookingUpdated { booking, .. } => {
            assert_eq!(booking.status.as_str(), "declined");
        }
        _ => unreachable!(),
    }
    // 辞退の ok ack を消化してから次の要求を送る
    let (event, _) = mentor
        .recv_until(|e| matches!(e, ServerEvent::Ack { event, .. } if event == "update_booking_status"))
        .await;
    assert_ack_ok(&event);

    mentor
        .send(json!({
            "event": "update_booking_status",
            "messageId": message_id,
            "status": "accepted",
            "meetingLink": "https://meet.google.com/abc"
        }))
        .await;

    // then (期待する結果): 終端状態からの遷移は validation エラー、broadcast なし
    let (event, skipped) = mentor
        .recv_until(|e| matches!(e, ServerEvent::Ack { event, .. } if event == "update_booking_status"))
        .await;
    match event {
        ServerEvent::Ack { ok, error_kind, .. } => {
            assert!(!ok);
            assert_eq!(error_kind.as_deref(), Some("validation"));
        }
        _ => unreachable!(),
    }
    assert!(!skipped.iter().any(is_booking_updated));

    // 存在しないメッセージへの更新は not_found
    mentor
        .send(json!({
            "event": "update_booking_status",
            "messageId": "3f2a8c1e-0000-4000-8000-000000000000",
            "status": "declined"
        }))
        .await;
    let (event, _) = mentor
        .recv_until(|e| matches!(e, ServerEvent::Ack { event, .. } if event == "update_booking_status"))
        .await;
    match event {
        ServerEvent::Ack { ok, error_kind, .. } => {
            assert!(!ok);
            assert_eq!(error_kind.as_deref(), Some("not_found"));
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_message_queued_when_recipient_offline() {
    // テスト項目: 受信者がオフラインのとき送信者に message_queued が届く
    // given (前提条件): 学生のみ接続
    let port = start_test_server().await;
    let mut student = TestClient::connect(port).await;
    student.register("student-1", "user").await;
    student.join_chat("mentor-9", "student-1").await;

    // when (操作):
    student
        .send(json!({
            "event": "send_message",
            "mentorId": "mentor-9",
            "userId": "student-1",
            "message": "Are you there?",
            "type": "text"
        }))
        .await;

    // then (期待する結果): message_queued が届く（配信は次回の履歴取得まで保留）
    let (event, _) = student
        .recv_until(|e| matches!(e, ServerEvent::MessageQueued { .. }))
        .await;
    match event {
        ServerEvent::MessageQueued { recipient, .. } => {
            assert_eq!(recipient, "mentor-9");
        }
        _ => unreachable!(),
    }

    // メッセージ自体は永続化されており、履歴取得で配信される
    let history: Value = reqwest::Client::new()
        .get(format!("http://127.0.0.1:{port}/api/messages/mentor-9/student-1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history["messages"].as_array().unwrap().len(), 1);
    assert_eq!(history["messages"][0]["text"], json!("Are you there?"));
}

#[tokio::test]
async fn test_typing_relay_excludes_sender() {
    // テスト項目: タイピング中継が送信者自身には届かない
    // given (前提条件): 両者が接続し、学生がルームに参加（メンターは自動購読）
    let port = start_test_server().await;
    let mut student = TestClient::connect(port).await;
    let mut mentor = TestClient::connect(port).await;
    student.register("student-1", "user").await;
    mentor.register("mentor-1", "mentor").await;
    student.join_chat("mentor-1", "student-1").await;

    // when (操作): 学生がタイピング開始
    student
        .send(json!({
            "event": "typing_start",
            "roomId": "private_mentor-1_student-1",
            "userId": "student-1"
        }))
        .await;

    // then (期待する結果): メンターに user_typing が届く
    let (event, _) = mentor
        .recv_until(|e| matches!(e, ServerEvent::UserTyping { .. }))
        .await;
    match event {
        ServerEvent::UserTyping { user_id, is_typing } => {
            assert_eq!(user_id, "student-1");
            assert!(is_typing);
        }
        _ => unreachable!(),
    }

    // 学生自身は ack のみを受け取り、user_typing は受け取らない
    let (event, skipped) = student
        .recv_until(|e| matches!(e, ServerEvent::Ack { event, .. } if event == "typing_start"))
        .await;
    assert_ack_ok(&event);
    assert!(
        !skipped
            .iter()
            .any(|e| matches!(e, ServerEvent::UserTyping { .. }))
    );
}

#[tokio::test]
async fn test_rest_unread_and_mark_read_converge() {
    // テスト項目: 未読集計と既読化（REST 経路）の一貫性
    // given (前提条件): 学生がメンター宛てに 3 件送信（メンターはオフライン）
    let port = start_test_server().await;
    let mut student = TestClient::connect(port).await;
    student.register("student-1", "user").await;
    student.join_chat("mentor-1", "student-1").await;

    for i in 0..3 {
        student
            .send(json!({
                "event": "send_message",
                "mentorId": "mentor-1",
                "userId": "student-1",
                "message": format!("message {i}"),
                "type": "text"
            }))
            .await;
        let (event, _) = student
            .recv_until(|e| matches!(e, ServerEvent::Ack { event, .. } if event == "send_message"))
            .await;
        assert_ack_ok(&event);
    }

    let client = reqwest::Client::new();

    // when (操作): メンター視点の会話一覧と未読集計
    let conversations: Value = client
        .get(format!("http://127.0.0.1:{port}/api/messages/conversations/mentor-1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let listed = conversations["conversations"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["unreadCount"], json!(3));
    assert_eq!(listed[0]["otherParticipant"], json!("student-1"));
    assert_eq!(listed[0]["lastMessage"]["text"], json!("message 2"));

    let unread: Value = client
        .get(format!("http://127.0.0.1:{port}/api/messages/unread/mentor-1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(unread["unread"][0]["unreadCount"], json!(3));

    // when (操作): 既読化を二度呼ぶ（冪等性）
    let first: Value = client
        .post(format!("http://127.0.0.1:{port}/api/messages/mark-read"))
        .json(&json!({"roomId": "private_mentor-1_student-1", "userId": "mentor-1"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["markedRead"], json!(3));

    let second: Value = client
        .post(format!("http://127.0.0.1:{port}/api/messages/mark-read"))
        .json(&json!({"roomId": "private_mentor-1_student-1", "userId": "mentor-1"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["markedRead"], json!(0));

    // then (期待する結果): 未読はゼロになる
    let unread: Value = client
        .get(format!("http://127.0.0.1:{port}/api/messages/unread/mentor-1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(unread["unread"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_rest_notification_authorization_and_deletion() {
    // テスト項目: 通知の認可（403 / 400）と会話削除の確認マーカー
    // given (前提条件): レビュー投稿によりメンター宛ての通知が 1 件
    let port = start_test_server().await;
    let client = reqwest::Client::new();

    let created: Value = client
        .post(format!("http://127.0.0.1:{port}/api/reviews"))
        .json(&json!({
            "mentorId": "mentor-1",
            "studentId": "student-1",
            "reviewId": "review-42",
            "rating": 5,
            "comment": "Great mentor!"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(created["success"], json!(true));

    // when (操作) / then (期待する結果): 識別ヘッダなしは 400、他人は 403
    let response = client
        .get(format!("http://127.0.0.1:{port}/api/notifications/mentor-1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = client
        .get(format!("http://127.0.0.1:{port}/api/notifications/mentor-1"))
        .header("X-User-Id", "student-1")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // 本人は review 通知（relatedId = レビュー ID）を見られる
    let notifications: Value = client
        .get(format!("http://127.0.0.1:{port}/api/notifications/mentor-1"))
        .header("X-User-Id", "mentor-1")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let listed = notifications["notifications"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["kind"], json!("review"));
    assert_eq!(listed[0]["relatedId"], json!("review-42"));

    // 不正な rating は境界で拒否される
    let response = client
        .post(format!("http://127.0.0.1:{port}/api/reviews"))
        .json(&json!({
            "mentorId": "mentor-1",
            "studentId": "student-1",
            "reviewId": "review-43",
            "rating": 6
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // 会話削除は確認マーカーなしでは 400
    let response = client
        .delete(format!(
            "http://127.0.0.1:{port}/api/messages/conversations/private_mentor-1_student-1"
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let deleted: Value = client
        .delete(format!(
            "http://127.0.0.1:{port}/api/messages/conversations/private_mentor-1_student-1?confirm=true"
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(deleted["success"], json!(true));
}
