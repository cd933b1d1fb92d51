// Listener supervision, subprocess streams and end-to-end sessions

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::*;
use swaybar_status::error::SourceError;
use swaybar_status::listener::{
    LineStream, Listener, ListenerEvent, Reporter, VolumeListener, WindowListener, query_sink,
    run_with_backoff,
};
use swaybar_status::models::VolumeState;
use swaybar_status::scheduler::Message;
use swaybar_status::units::{UnitId, Update, WindowChange};
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout};

const SINK_INFO: &str = "\
Default sink name: alsa_output.analog-stereo
2 sink(s) available.
    index: 0
\tname: <hdmi_output>
\tvolume: front-left: 26214 /  40% / -23.88 dB
\tmuted: yes
  * index: 1
\tname: <alsa_output.analog-stereo>
\tvolume: front-left: 45875 /  70% / -9.29 dB,   front-right: 45875 /  70% / -9.29 dB
\tmuted: no
";

fn sh(script: &str) -> Vec<String> {
    vec!["sh".into(), "-c".into(), script.into()]
}

async fn next(rx: &mut mpsc::Receiver<Message>) -> Message {
    timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("listener message in time")
        .expect("channel open")
}

#[tokio::test(start_paused = true)]
async fn test_failed_session_restarts_once_per_backoff() {
    let (tx, mut rx) = mpsc::channel(16);
    let sessions = Arc::new(AtomicUsize::new(0));
    let counter = sessions.clone();
    let reporter = Reporter::new(UnitId(3), "volume", tx);
    let start = Instant::now();

    let handle = tokio::spawn(run_with_backoff(
        reporter,
        Duration::from_millis(500),
        move |_r: Reporter| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(SourceError::stream("boom"))
            }
        },
    ));

    for _ in 0..3 {
        let msg = next(&mut rx).await;
        assert_eq!(msg.unit, UnitId(3));
        assert!(matches!(
            msg.event,
            ListenerEvent::Failed(SourceError::Stream(ref m)) if m == "boom"
        ));
    }
    assert_eq!(sessions.load(Ordering::SeqCst), 3);
    assert!(start.elapsed() >= Duration::from_millis(1000));

    // Scheduler gone: the supervisor stops after the current session
    drop(rx);
    timeout(Duration::from_secs(5), handle)
        .await
        .expect("listener exits")
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_clean_end_of_stream_is_reported_as_failure() {
    let (tx, mut rx) = mpsc::channel(16);
    let handle = tokio::spawn(run_with_backoff(
        Reporter::new(UnitId(0), "window", tx),
        Duration::from_secs(1),
        |r: Reporter| async move {
            r.connected().await?;
            Ok(())
        },
    ));
    assert!(matches!(next(&mut rx).await.event, ListenerEvent::Connected));
    match next(&mut rx).await.event {
        ListenerEvent::Failed(err) => assert_eq!(err.to_string(), "stream: event stream ended"),
        other => panic!("unexpected event {other:?}"),
    }
    handle.abort();
}

#[tokio::test]
async fn test_line_stream_reads_until_eof() {
    let mut stream = LineStream::spawn(&sh("printf 'one\\ntwo\\n'")).unwrap();
    assert_eq!(stream.program(), "sh");
    assert_eq!(stream.next_line().await.unwrap().as_deref(), Some("one"));
    assert_eq!(stream.next_line().await.unwrap().as_deref(), Some("two"));
    assert_eq!(stream.next_line().await.unwrap(), None);
}

#[tokio::test]
async fn test_line_stream_spawn_errors() {
    assert!(matches!(
        LineStream::spawn(&[]),
        Err(SourceError::Stream(_))
    ));
    assert!(matches!(
        LineStream::spawn(&["/nonexistent/definitely-not-here".to_string()]),
        Err(SourceError::Stream(_))
    ));
}

#[tokio::test]
async fn test_query_sink_reads_default_sink() {
    let fx = Fixture::new();
    let info = fx.write("info", SINK_INFO);
    let argv = vec!["cat".to_string(), info.display().to_string()];
    assert_eq!(
        query_sink(&argv).await.unwrap(),
        VolumeState {
            percent: 70,
            muted: false,
        }
    );
}

#[tokio::test]
async fn test_query_sink_without_default_is_missing_field() {
    let err = query_sink(&sh("echo nothing here")).await.unwrap_err();
    assert!(matches!(err, SourceError::MissingField("default sink name")));
}

#[tokio::test]
async fn test_volume_session_queries_on_connect_and_on_change() {
    let fx = Fixture::new();
    let info = fx.write("info", SINK_INFO);
    let listener = Listener::Volume(VolumeListener {
        subscribe: sh("echo \"Event 'new' on client #5\"; echo \"Event 'change' on sink #1\""),
        query: vec!["cat".into(), info.display().to_string()],
    });
    let (tx, mut rx) = mpsc::channel(16);
    let handle = listener.spawn(
        Reporter::new(UnitId(1), "volume", tx),
        Duration::from_secs(60),
    );

    let expected = Update::Volume(VolumeState {
        percent: 70,
        muted: false,
    });
    assert!(matches!(next(&mut rx).await.event, ListenerEvent::Connected));
    for _ in 0..2 {
        match next(&mut rx).await.event {
            ListenerEvent::Update(update) => assert_eq!(update, expected),
            other => panic!("unexpected event {other:?}"),
        }
    }
    assert!(matches!(next(&mut rx).await.event, ListenerEvent::Failed(_)));
    handle.abort();
}

#[tokio::test]
async fn test_window_session_forwards_title_and_layout() {
    let script = r#"printf '%s\n' '{"success":true}' '{"change":"focus","container":{"name":"vim"}}' '{"change":"xkb_layout","input":{"xkb_active_layout_name":"US","xkb_active_layout_index":0}}'"#;
    let listener = Listener::Window(WindowListener {
        command: sh(script),
    });
    let (tx, mut rx) = mpsc::channel(16);
    let handle = listener.spawn(Reporter::new(UnitId(0), "window", tx), Duration::from_secs(60));

    assert!(matches!(next(&mut rx).await.event, ListenerEvent::Connected));
    match next(&mut rx).await.event {
        ListenerEvent::Update(update) => assert_eq!(
            update,
            Update::Window(WindowChange {
                title: Some("vim".into()),
                layout_index: None,
            })
        ),
        other => panic!("unexpected event {other:?}"),
    }
    match next(&mut rx).await.event {
        ListenerEvent::Update(update) => assert_eq!(
            update,
            Update::Window(WindowChange {
                title: None,
                layout_index: Some(0),
            })
        ),
        other => panic!("unexpected event {other:?}"),
    }
    assert!(matches!(next(&mut rx).await.event, ListenerEvent::Failed(_)));
    handle.abort();
}
