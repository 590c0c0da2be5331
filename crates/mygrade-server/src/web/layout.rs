//! Page shell shared by every HTML route

use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::time::Duration;

use crate::features::lookup::queries::find_student::Celebration;

/// Per-page switches for the shell
#[derive(Debug, Clone, Default)]
pub struct PageOptions {
    /// Reload after this long without interaction so the server can apply
    /// its own expiry
    pub inactivity: Option<Duration>,
    /// Server-sent event endpoint whose pushes refresh the page
    pub live: Option<String>,
    pub celebration: Option<Celebration>,
    /// Show the admin navigation bar
    pub admin_nav: bool,
}

pub fn page(title: &str, options: &PageOptions, body: Markup) -> Markup {
    let inactivity_ms = options.inactivity.map(|timeout| timeout.as_millis() as u64);

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " | MyGrade" }
                style { (PreEscaped(CSS)) }
            }
            body data-inactivity-ms=[inactivity_ms] data-live=[options.live.as_deref()] {
                @if options.admin_nav {
                    (admin_nav())
                }
                main.container {
                    (body)
                }
                @if let Some(celebration) = options.celebration {
                    div #confetti data-duration-ms=(celebration.duration_ms) {
                        @for piece in 0..24 {
                            span.piece style={ "--i:" (piece) } {}
                        }
                    }
                }
                script { (PreEscaped(SCRIPT)) }
            }
        }
    }
}

fn admin_nav() -> Markup {
    html! {
        nav.admin-nav {
            span.brand { "MyGrade Admin" }
            a href="/admin/dashboard" { "Dashboard" }
            a href="/admin/classrecord" { "Class Records" }
            a.logout href="/admin/logout" { "Logout" }
        }
    }
}

/// Inline error or success line under a form
pub fn message(text: Option<&str>, class: &str) -> Markup {
    html! {
        @if let Some(text) = text {
            p class={ "message " (class) } role="alert" { (text) }
        }
    }
}

/// Yes/No prompt before a destructive action
pub fn confirm_dialog(prompt: &str, action: &str, cancel: &str) -> Markup {
    html! {
        div.dialog role="alertdialog" {
            p { (prompt) }
            form method="post" action=(action) {
                input type="hidden" name="confirm" value="true";
                button.danger type="submit" { "Yes" }
                a.button href=(cancel) { "No" }
            }
        }
    }
}

const SCRIPT: &str = r#"
(function () {
  var body = document.body;
  var timeout = Number(body.dataset.inactivityMs || 0);
  if (timeout > 0) {
    var timer = null;
    var lastBeat = 0;
    var arm = function () {
      clearTimeout(timer);
      timer = setTimeout(function () { location.reload(); }, timeout + 1000);
    };
    var beat = function (kind) {
      arm();
      var now = Date.now();
      if (now - lastBeat < 15000) return;
      lastBeat = now;
      fetch('/api/v1/activity', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({ kind: kind }),
        credentials: 'same-origin'
      }).then(function (r) { return r.json(); }).then(function (r) {
        if (r && r.data && r.data.redirect) location.href = r.data.redirect;
      }).catch(function () {});
    };
    [['mousemove', 'pointer_move'], ['keydown', 'key_press'], ['click', 'click'], ['scroll', 'scroll']]
      .forEach(function (pair) {
        window.addEventListener(pair[0], function () { beat(pair[1]); }, { passive: true });
      });
    arm();
  }

  var live = body.dataset.live;
  if (live && window.EventSource) {
    var first = true;
    var source = new EventSource(live);
    source.addEventListener('snapshot', function (event) {
      if (first) { first = false; return; }
      if (typeof window.onLiveSnapshot === 'function') {
        window.onLiveSnapshot(JSON.parse(event.data));
      } else if (!document.querySelector('[data-editing]')) {
        location.reload();
      }
    });
  }

  var confetti = document.getElementById('confetti');
  if (confetti) {
    setTimeout(function () { confetti.remove(); }, Number(confetti.dataset.durationMs));
  }
})();
"#;

const CSS: &str = r#"
* { box-sizing: border-box; margin: 0; padding: 0; }
body { font-family: system-ui, -apple-system, sans-serif; background: #f4f6fb; color: #1d2433; line-height: 1.45; }
.container { max-width: 1100px; margin: 0 auto; padding: 32px 20px 60px; }
h1 { font-size: 1.8em; margin-bottom: 16px; }
h2 { font-size: 1.3em; margin: 20px 0 10px; }
form.stack { display: grid; gap: 10px; max-width: 420px; }
input, select { padding: 8px 10px; border: 1px solid #c6cbd8; border-radius: 6px; font: inherit; }
button, a.button { display: inline-block; padding: 8px 14px; border: 0; border-radius: 6px; background: #2f5bea; color: #fff; font: inherit; cursor: pointer; text-decoration: none; }
button.danger { background: #d64242; }
a.button.secondary, button.secondary { background: #8a93a6; }
.message { margin-top: 10px; font-weight: 600; }
.message.error { color: #c62828; }
.message.success { color: #2e7d32; }
.grade { font-size: 3em; font-weight: 800; margin: 12px 0; }
.grade.passing { color: #2e7d32; }
.grade.failing { color: #c62828; }
.missed { color: #c62828; font-style: italic; }
.admin-nav { display: flex; gap: 18px; align-items: center; padding: 12px 20px; background: #1d2433; }
.admin-nav a, .admin-nav .brand { color: #fff; text-decoration: none; }
.admin-nav .brand { font-weight: 800; margin-right: auto; }
.cards { display: grid; grid-template-columns: repeat(auto-fit, minmax(170px, 1fr)); gap: 14px; }
.card { background: #fff; border-radius: 10px; padding: 16px; box-shadow: 0 1px 3px rgba(0,0,0,.08); }
.card .value { font-size: 2em; font-weight: 800; }
table { width: 100%; border-collapse: collapse; background: #fff; margin-top: 10px; }
th, td { padding: 6px 8px; border: 1px solid #e1e5ee; text-align: left; font-size: .92em; }
th.group { text-align: center; background: #eef1f8; }
td input { width: 100%; min-width: 70px; }
.calendar td.muted { color: #a0a7b8; }
.calendar td.today { background: #2f5bea; color: #fff; font-weight: 700; }
.calendar td.week { color: #8a93a6; font-size: .8em; }
.pager { display: flex; gap: 8px; align-items: center; margin-top: 10px; }
.dialog { background: #fff7e6; border: 1px solid #f0c36d; padding: 14px; border-radius: 8px; margin: 12px 0; }
.dialog form { display: flex; gap: 10px; margin-top: 8px; }
.notice { background: #fdecea; border: 1px solid #f5c2c0; padding: 14px; border-radius: 8px; margin-bottom: 14px; }
.toolbar { display: flex; flex-wrap: wrap; gap: 10px; align-items: center; margin: 10px 0; }
#confetti { position: fixed; inset: 0; pointer-events: none; overflow: hidden; }
#confetti .piece { position: absolute; top: -12px; left: calc(var(--i) * 4.1%); width: 8px; height: 14px;
  background: hsl(calc(var(--i) * 37), 80%, 55%); animation: fall 2.6s linear infinite; animation-delay: calc(var(--i) * -0.11s); }
@keyframes fall { to { transform: translateY(105vh) rotate(540deg); } }
"#;
