use super::key_buffer::KeyBuffer;
use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How long a key counts as held after the terminal reported it.
const KEY_TIMEOUT: Duration = Duration::from_millis(150);

/// How often the listener wakes up to see if it should stop.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A struct for managing keypresses that will automatically
/// start a thread that grabs keypresses.
pub struct KeyManager {
    stop: Arc<AtomicBool>,
    quit: Arc<AtomicBool>,
    key_buffer: Arc<KeyBuffer>,
    event_listener: Option<JoinHandle<()>>,
}

impl KeyManager {
    // Start event listener thread
    pub fn new() -> KeyManager {
        let stop = Arc::new(AtomicBool::new(false));
        let quit = Arc::new(AtomicBool::new(false));
        let key_buffer = Arc::new(KeyBuffer::new(KEY_TIMEOUT));
        let event_listener = event_listener(stop.clone(), quit.clone(), key_buffer.clone());
        KeyManager {
            stop,
            quit,
            key_buffer,
            event_listener: Some(event_listener),
        }
    }

    pub fn key_buffer(&self) -> Arc<KeyBuffer> {
        self.key_buffer.clone()
    }

    /// Whether the user asked to leave
    pub fn quit_requested(&self) -> bool {
        self.quit.load(Ordering::SeqCst)
    }
}

impl Drop for KeyManager {
    fn drop(&mut self) {
        // Tell the event listener to stop, it notices within one poll interval
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.event_listener.take() {
            if handle.join().is_err() {
                log::error!("Key listener panicked");
            }
        }
    }
}

/// Starts a thread that listens for key events and records them in the key buffer.
fn event_listener(
    stop: Arc<AtomicBool>,
    quit: Arc<AtomicBool>,
    key_buffer: Arc<KeyBuffer>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while !stop.load(Ordering::SeqCst) {
            let event = match poll(POLL_INTERVAL).and_then(|ready| {
                if ready {
                    read().map(Some)
                } else {
                    Ok(None)
                }
            }) {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(e) => {
                    log::error!("Could not read terminal events: {}", e);
                    quit.store(true, Ordering::SeqCst);
                    break;
                }
            };
            log::trace!("Got event {:?}", event);

            // Investigate the event
            if let Event::Key(key_event) = event {
                if is_quit(key_event) {
                    quit.store(true, Ordering::SeqCst);
                } else if let Some(key) = key_to_hex(key_event.code) {
                    key_buffer.press(key);
                }
            }
        }
    })
}

/// Raw mode swallows Ctrl-C, so it is handled here along with Esc.
fn is_quit(key_event: KeyEvent) -> bool {
    match key_event.code {
        KeyCode::Esc => true,
        KeyCode::Char('c') => key_event.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// The hex keypad laid out on the left of a QWERTZ keyboard.
/// `z` also maps to `A` so the layout works on QWERTY.
///
/// ```text
/// 1 2 3 C        1 2 3 4
/// 4 5 6 D   <-   q w e r
/// 7 8 9 E        a s d f
/// A 0 B F        y x c v
/// ```
fn key_to_hex(key: KeyCode) -> Option<u8> {
    let c = match key {
        KeyCode::Char(c) => c.to_ascii_lowercase(),
        _ => return None,
    };
    let hex = match c {
        '1' => 0x1,
        '2' => 0x2,
        '3' => 0x3,
        '4' => 0xC,
        'q' => 0x4,
        'w' => 0x5,
        'e' => 0x6,
        'r' => 0xD,
        'a' => 0x7,
        's' => 0x8,
        'd' => 0x9,
        'f' => 0xE,
        'y' | 'z' => 0xA,
        'x' => 0x0,
        'c' => 0xB,
        'v' => 0xF,
        _ => return None,
    };
    Some(hex)
}
