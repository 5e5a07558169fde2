//! Throwaway HTTP responder for exercising the reqwest clients against real sockets.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// A request as seen by [`serve_once`].
pub struct CapturedRequest {
  pub head: String,
  pub body: String,
}

/// Accept a single connection, answer it with `status` and `body`, and report what was received.
/// Returns the base URL (`http://127.0.0.1:<port>`) and a receiver for the captured request.
pub async fn serve_once(status: u16, body: &str) -> (String, oneshot::Receiver<CapturedRequest>) {
  let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
  let addr = listener.local_addr().expect("listener address");
  let body = body.to_string();
  let (tx, rx) = oneshot::channel();

  tokio::spawn(async move {
    let Ok((mut socket, _)) = listener.accept().await else { return };
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
      let Ok(n) = socket.read(&mut chunk).await else { return };
      if n == 0 {
        return;
      }
      buf.extend_from_slice(&chunk[..n]);
      if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
        break pos + 4;
      }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
      .lines()
      .find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim().eq_ignore_ascii_case("content-length").then(|| value.trim().parse::<usize>().ok())?
      })
      .unwrap_or(0);
    while buf.len() < header_end + content_length {
      let Ok(n) = socket.read(&mut chunk).await else { return };
      if n == 0 {
        break;
      }
      buf.extend_from_slice(&chunk[..n]);
    }
    let request_body = String::from_utf8_lossy(&buf[header_end..]).to_string();

    let response = format!(
      "HTTP/1.1 {} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
      status,
      body.len(),
      body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
    let _ = tx.send(CapturedRequest { head, body: request_body });
  });

  (format!("http://{}", addr), rx)
}

/// Accept one connection and answer with `head` only (possibly nothing), then hold the socket
/// open until the client gives up.
pub async fn serve_stalled(head: &str) -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
  let addr = listener.local_addr().expect("listener address");
  let head = head.to_string();

  tokio::spawn(async move {
    let Ok((mut socket, _)) = listener.accept().await else { return };
    let mut chunk = [0u8; 4096];
    let mut buf = Vec::new();
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
      match socket.read(&mut chunk).await {
        Ok(0) | Err(_) => return,
        Ok(n) => buf.extend_from_slice(&chunk[..n]),
      }
    }
    if !head.is_empty() && socket.write_all(head.as_bytes()).await.is_err() {
      return;
    }
    while let Ok(n) = socket.read(&mut chunk).await {
      if n == 0 {
        break;
      }
    }
  });

  format!("http://{}", addr)
}

/// A base URL nothing is listening on.
pub async fn dead_endpoint() -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
  let addr = listener.local_addr().expect("listener address");
  drop(listener);
  format!("http://{}", addr)
}
