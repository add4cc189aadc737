//! Static chat client served at the root route.
//!
//! Plain request/response cycle against `/api/chat`; history lives in
//! the browser's local storage and engine state is flushed through
//! `/api/save` when the page unloads.

use axum::response::Html;

pub async fn chat_page() -> Html<&'static str> {
    Html(CHAT_PAGE)
}

const CHAT_PAGE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Nexus</title>
<style>
*{margin:0;padding:0;box-sizing:border-box}
body{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;background:#fff;color:#000;height:100vh;display:flex;flex-direction:column}
header{border-bottom:1px solid #e0e0e0;padding:12px 20px;display:flex;justify-content:space-between;align-items:center}
.brand{display:flex;align-items:center;gap:12px}
.logo{width:32px;height:32px;background:#000;border-radius:6px;color:#fff;font-weight:700;display:flex;align-items:center;justify-content:center}
h1{font-size:18px;font-weight:600}
.btn{padding:6px 14px;background:#fff;border:1px solid #e0e0e0;border-radius:6px;font-size:13px;cursor:pointer}
.btn:hover{background:#f5f5f5}
.messages{flex:1;overflow-y:auto;padding:20px;max-width:800px;width:100%;margin:0 auto}
.message{display:flex;gap:10px;margin-bottom:20px}
.avatar{width:28px;height:28px;border-radius:6px;border:1px solid #e0e0e0;font-size:13px;font-weight:600;display:flex;align-items:center;justify-content:center;flex-shrink:0}
.message.user .avatar{background:#f5f5f5}
.message.ai .avatar{background:#000;color:#fff;border-color:#000}
.text{font-size:14px;line-height:1.6;padding:10px 14px;border-radius:8px;background:#fafafa;border:1px solid #e0e0e0}
.input-area{padding:16px 20px;border-top:1px solid #e0e0e0}
.wrapper{max-width:800px;margin:0 auto;display:flex;gap:10px}
textarea{flex:1;padding:10px 12px;border:1px solid #e0e0e0;border-radius:8px;font-size:14px;font-family:inherit;resize:none;background:#fafafa}
textarea:focus{outline:none;border-color:#000;background:#fff}
.send{padding:10px 20px;background:#000;color:#fff;border:none;border-radius:8px;font-size:14px;font-weight:600;cursor:pointer}
.send:disabled{background:#e0e0e0;color:#999;cursor:not-allowed}
.typing{display:none;gap:6px;align-items:center;padding:8px 12px;margin-bottom:10px;color:#666;font-size:13px;background:#f5f5f5;border-radius:8px;width:fit-content}
.typing.active{display:flex}
.dot{width:4px;height:4px;border-radius:50%;background:#000;animation:blink 1.4s ease-in-out infinite}
.dot:nth-child(2){animation-delay:.2s}
.dot:nth-child(3){animation-delay:.4s}
@keyframes blink{0%,60%,100%{opacity:.3}30%{opacity:1}}
</style>
</head>
<body>
<header>
<div class="brand"><div class="logo">N</div><h1>Nexus</h1></div>
<button class="btn" onclick="clearChat()">Clear</button>
</header>
<div class="messages" id="messages"></div>
<div class="input-area">
<div class="typing" id="typing"><span>Processing</span><div class="dot"></div><div class="dot"></div><div class="dot"></div></div>
<div class="wrapper"><textarea id="input" placeholder="Message Nexus..." rows="1"></textarea><button class="send" id="send">Send</button></div>
</div>
<script>
let history = [];
let busy = false;
const input = document.getElementById('input');
const sendBtn = document.getElementById('send');
const messages = document.getElementById('messages');
const typing = document.getElementById('typing');

input.addEventListener('input', function () {
  this.style.height = 'auto';
  this.style.height = Math.min(this.scrollHeight, 120) + 'px';
});

function addMessage(role, text) {
  const row = document.createElement('div');
  row.className = 'message ' + role;
  const avatar = document.createElement('div');
  avatar.className = 'avatar';
  avatar.textContent = role === 'user' ? 'U' : 'N';
  const body = document.createElement('div');
  body.className = 'text';
  body.textContent = text;
  row.appendChild(avatar);
  row.appendChild(body);
  messages.appendChild(row);
  messages.scrollTop = messages.scrollHeight;
}

async function send() {
  const value = input.value.trim();
  if (busy || !value) return;
  busy = true;
  addMessage('user', value);
  history.push({ role: 'user', text: value });
  input.value = '';
  input.style.height = 'auto';
  typing.classList.add('active');
  sendBtn.disabled = true;
  try {
    const res = await fetch('/api/chat', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ message: value })
    });
    const data = await res.json();
    if (data.status === 'ok') {
      addMessage('ai', data.response);
      history.push({ role: 'ai', text: data.response });
      persist();
    } else {
      addMessage('ai', 'Error: ' + data.message);
    }
  } catch (e) {
    addMessage('ai', 'Connection error');
  }
  typing.classList.remove('active');
  busy = false;
  sendBtn.disabled = false;
  input.focus();
}

function persist() {
  try { localStorage.setItem('nexus_history', JSON.stringify(history)); } catch (e) {}
}

function restore() {
  try {
    const saved = localStorage.getItem('nexus_history');
    if (saved) {
      history = JSON.parse(saved);
      history.forEach(m => addMessage(m.role, m.text));
    }
  } catch (e) {}
}

window.clearChat = function () {
  if (!confirm('Clear all messages?')) return;
  history = [];
  localStorage.removeItem('nexus_history');
  messages.innerHTML = '';
};

sendBtn.addEventListener('click', send);
input.addEventListener('keydown', e => {
  if (e.key === 'Enter' && !e.shiftKey) { e.preventDefault(); send(); }
});
window.addEventListener('beforeunload', () => {
  persist();
  navigator.sendBeacon('/api/save');
});
restore();
input.focus();
</script>
</body>
</html>"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_targets_the_chat_routes() {
        assert!(CHAT_PAGE.contains("/api/chat"));
        assert!(CHAT_PAGE.contains("/api/save"));
        assert!(CHAT_PAGE.starts_with("<!DOCTYPE html>"));
    }
}
