// Lecture vidéo via ffmpeg en subprocess (std::process::Command).
// Prérequis : `ffmpeg` et `ffprobe` accessibles dans le PATH.
//
// Architecture :
//   - `probe_video`       : interroge ffprobe (width/height/fps)
//   - `spawn_ffmpeg_pipe` : lance ffmpeg → flux raw RGBA sur stdout
//   - `decode_loop`       : thread dédié, lit les frames, gère les commandes
//   - `VideoPlayer`       : côté appelant, implémente `VideoSource`

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use aimg_core::error::CaptureError;
use aimg_core::frame::FrameBuffer;
use aimg_core::traits::VideoSource;
use anyhow::{Context, Result, bail};
use flume::{Receiver, Sender, TryRecvError, TrySendError};

/// Taille du pool de frames pré-allouées, supérieure à la capacité du canal.
const POOL_SIZE: usize = 6;
const CHANNEL_CAPACITY: usize = 3;

/// Attente entre deux scrutations des commandes en pause ou après EOF.
const IDLE_POLL: Duration = Duration::from_millis(10);

/// Commandes envoyées au thread de décodage.
///
/// # Example
/// ```
/// use aimg_source::video::VideoCommand;
/// let cmd = VideoCommand::Seek(5.0);
/// assert!(matches!(cmd, VideoCommand::Seek(_)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VideoCommand {
    /// Reprendre la lecture.
    Play,
    /// Mettre en pause.
    Pause,
    /// Sauter de `delta` secondes (positif = avance).
    Seek(f64),
    /// Revenir au début, y compris après la fin du flux.
    Rewind,
    /// Arrêter le thread.
    Quit,
}

/// Métadonnées extraites via ffprobe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Images par seconde natives (23.976, 30.0…).
    pub fps: f64,
}

/// État partagé entre le lecteur et le thread de décodage.
#[derive(Debug, Default)]
struct Shared {
    paused: AtomicBool,
    ended: AtomicBool,
    /// Incrémenté à chaque seek/rewind ; les frames d'une époque antérieure
    /// sont ignorées.
    epoch: AtomicU64,
    position_ms: AtomicU64,
}

/// Parse la sortie `key=value` de ffprobe.
fn parse_probe(text: &str) -> Option<VideoInfo> {
    let mut width = None;
    let mut height = None;
    let mut fps = None;

    for line in text.lines() {
        if let Some(val) = line.strip_prefix("width=") {
            width = val.trim().parse::<u32>().ok();
        } else if let Some(val) = line.strip_prefix("height=") {
            height = val.trim().parse::<u32>().ok();
        } else if let Some(val) = line.strip_prefix("r_frame_rate=") {
            // "24/1", "30000/1001"
            let mut parts = val.trim().splitn(2, '/');
            let num: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0.0);
            let den: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1.0);
            if den > 0.0 && num > 0.0 {
                fps = Some(num / den);
            }
        }
    }

    let (width, height) = (width?, height?);
    if width == 0 || height == 0 {
        return None;
    }
    Some(VideoInfo {
        width,
        height,
        fps: fps.unwrap_or(30.0),
    })
}

/// Interroge `ffprobe` pour obtenir les métadonnées du flux vidéo principal.
///
/// # Errors
/// Retourne une erreur si `ffprobe` est introuvable ou si le fichier ne
/// contient aucun flux vidéo décodable.
pub fn probe_video(path: &Path) -> Result<VideoInfo> {
    let path_str = path.to_str().context("Chemin vidéo invalide (non-UTF8)")?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate",
            "-of",
            "default=noprint_wrappers=1",
            "-i",
            path_str,
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .context("Impossible de lancer ffprobe. Vérifiez qu'il est installé et dans le PATH.")?;

    let Some(info) = parse_probe(&String::from_utf8_lossy(&output.stdout)) else {
        bail!("ffprobe n'a trouvé aucun flux vidéo dans {}", path.display());
    };
    log::info!(
        "probe_video: {}x{} @ {:.3}fps, {}",
        info.width,
        info.height,
        info.fps,
        path.display()
    );
    Ok(info)
}

/// Taille du pipe ffmpeg : la vidéo réduite (jamais agrandie) pour que son
/// plus grand côté tienne dans `max_side`, dimensions paires.
///
/// # Example
/// ```
/// use aimg_source::video::pipe_size;
/// assert_eq!(pipe_size(1920, 1080, 640), (640, 360));
/// assert_eq!(pipe_size(320, 240, 640), (320, 240));
/// ```
#[must_use]
pub fn pipe_size(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    let larger = width.max(height).max(1);
    let (w, h) = if larger <= max_side {
        (width, height)
    } else {
        let scale = f64::from(max_side) / f64::from(larger);
        (
            (f64::from(width) * scale).round() as u32,
            (f64::from(height) * scale).round() as u32,
        )
    };
    let even = |v: u32| (v & !1).max(2);
    (even(w), even(h))
}

/// Lance un processus `ffmpeg` qui écrit des frames RGBA brutes sur stdout.
///
/// Chaque frame = `w × h × 4` octets. `-ss` avant `-i` = seek rapide.
/// Retourne `None` si le spawn échoue (log::warn émis).
#[must_use]
pub fn spawn_ffmpeg_pipe(path: &Path, w: u32, h: u32, pos_secs: f64, fps: u32) -> Option<Child> {
    let Some(path_str) = path.to_str() else {
        log::warn!("spawn_ffmpeg_pipe: chemin non-UTF8");
        return None;
    };

    let scale_filter = format!("scale={w}:{h}:flags=bilinear");
    let fps_str = fps.to_string();
    let pos_str = format!("{pos_secs:.3}");

    match Command::new("ffmpeg")
        .args([
            "-ss",
            &pos_str,
            "-i",
            path_str,
            "-vf",
            &scale_filter,
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-r",
            &fps_str,
            "-an",
            "-hide_banner",
            "-loglevel",
            "error",
            "pipe:1",
        ])
        .stdout(Stdio::piped())
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => {
            log::debug!("ffmpeg lancé : {w}x{h} @ {fps}fps depuis {pos_secs:.1}s");
            Some(child)
        }
        Err(e) => {
            log::warn!("spawn_ffmpeg_pipe: impossible de lancer ffmpeg: {e}");
            None
        }
    }
}

/// Lit exactement `buf.len()` octets depuis `reader`.
///
/// # Errors
/// `Ok(true)` si lu, `Ok(false)` sur EOF avant complétion, `Err` sur
/// erreur I/O.
pub fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut total = 0usize;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => return Ok(false),
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

fn kill(child: &mut Option<Child>) {
    if let Some(mut c) = child.take() {
        let _ = c.kill();
        let _ = c.wait();
    }
}

/// Slot libre du pool (`strong_count == 1`), alloué si tous sont pris.
fn find_or_create_slot(pool: &mut Vec<Arc<FrameBuffer>>, w: u32, h: u32) -> usize {
    if let Some(i) = pool.iter().position(|a| Arc::strong_count(a) == 1) {
        i
    } else {
        pool.push(Arc::new(FrameBuffer::new(w, h)));
        pool.len() - 1
    }
}

/// État du thread de décodage.
struct Decoder {
    path: PathBuf,
    w: u32,
    h: u32,
    fps: f64,
    pos_secs: f64,
    epoch: u64,
    child: Option<Child>,
    pool: Vec<Arc<FrameBuffer>>,
}

impl Decoder {
    fn restart(&mut self, shared: &Shared) {
        kill(&mut self.child);
        self.epoch = shared.epoch.load(Ordering::Acquire);
        self.child = spawn_ffmpeg_pipe(
            &self.path,
            self.w,
            self.h,
            self.pos_secs,
            self.fps.clamp(1.0, 60.0).round() as u32,
        );
        // Un EOF traité juste avant la commande a pu remettre `ended`.
        shared.ended.store(false, Ordering::Release);
        shared
            .position_ms
            .store((self.pos_secs * 1000.0) as u64, Ordering::Relaxed);
    }

    /// Applique les commandes en attente. `false` = le thread doit s'arrêter.
    fn process_commands(&mut self, cmd_rx: &Receiver<VideoCommand>, shared: &Shared) -> bool {
        let mut need_restart = false;
        loop {
            match cmd_rx.try_recv() {
                Ok(VideoCommand::Quit) | Err(TryRecvError::Disconnected) => {
                    kill(&mut self.child);
                    log::info!("Thread vidéo : arrêt demandé.");
                    return false;
                }
                Ok(VideoCommand::Pause) => log::debug!("Thread vidéo : pause"),
                Ok(VideoCommand::Play) => log::debug!("Thread vidéo : lecture"),
                Ok(VideoCommand::Seek(delta)) => {
                    self.pos_secs = (self.pos_secs + delta).max(0.0);
                    need_restart = true;
                    log::debug!("Thread vidéo : seek -> {:.1}s", self.pos_secs);
                }
                Ok(VideoCommand::Rewind) => {
                    self.pos_secs = 0.0;
                    need_restart = true;
                    log::debug!("Thread vidéo : retour au début");
                }
                Err(TryRecvError::Empty) => break,
            }
        }
        if need_restart {
            self.restart(shared);
        }
        true
    }
}

/// Boucle du thread de décodage.
///
/// Après EOF le thread reste vivant : `Rewind` ou `Seek` relancent ffmpeg.
fn decode_loop(
    mut dec: Decoder,
    frame_tx: &Sender<(u64, Arc<FrameBuffer>)>,
    cmd_rx: &Receiver<VideoCommand>,
    shared: &Shared,
) {
    let frame_period = Duration::from_secs_f64(1.0 / dec.fps.clamp(1.0, 120.0));
    let mut last_frame = Instant::now();
    dec.restart(shared);
    if dec.child.is_none() {
        // Le lecteur verra le canal fermé sans fin de flux : Fault.
        return;
    }

    loop {
        if !dec.process_commands(cmd_rx, shared) {
            return;
        }

        if shared.paused.load(Ordering::Acquire) || dec.child.is_none() {
            thread::sleep(IDLE_POLL);
            continue;
        }

        if let Some(remaining) = frame_period.checked_sub(last_frame.elapsed()) {
            thread::sleep(remaining);
            continue;
        }
        last_frame = Instant::now();

        let frame_bytes = dec.w as usize * dec.h as usize * 4;
        let idx = find_or_create_slot(&mut dec.pool, dec.w, dec.h);
        let Some(fb) = Arc::get_mut(&mut dec.pool[idx]) else {
            continue;
        };

        let read_result = dec
            .child
            .as_mut()
            .and_then(|c| c.stdout.as_mut())
            .map_or(Ok(false), |stdout| {
                read_exact_or_eof(stdout, &mut fb.data[..frame_bytes])
            });

        match read_result {
            Ok(true) => {
                match frame_tx.try_send((dec.epoch, Arc::clone(&dec.pool[idx]))) {
                    // Le lecteur ne veut que la dernière frame : un canal plein
                    // signifie qu'il ne consomme pas, on jette.
                    Ok(()) | Err(TrySendError::Full(_)) => {}
                    Err(TrySendError::Disconnected(_)) => {
                        kill(&mut dec.child);
                        return;
                    }
                }
                dec.pos_secs += 1.0 / dec.fps.max(1.0);
                shared
                    .position_ms
                    .store((dec.pos_secs * 1000.0) as u64, Ordering::Relaxed);
            }
            Ok(false) => {
                log::info!("Thread vidéo : EOF à {:.1}s", dec.pos_secs);
                kill(&mut dec.child);
                shared.ended.store(true, Ordering::Release);
            }
            Err(e) => {
                log::error!("Thread vidéo : erreur de lecture du pipe : {e}");
                kill(&mut dec.child);
                return;
            }
        }
    }
}

/// Lecteur vidéo : thread de décodage ffmpeg + état de lecture.
///
/// `capture_frame` renvoie toujours la frame la plus récente ; celles
/// restées en file sont sautées.
///
/// # Example
/// ```no_run
/// use aimg_source::video::VideoPlayer;
/// use aimg_core::traits::VideoSource;
/// use std::path::Path;
///
/// let mut player = VideoPlayer::open(Path::new("clip.mp4"), 640).unwrap();
/// player.pause();
/// assert!(player.is_paused());
/// ```
pub struct VideoPlayer {
    info: VideoInfo,
    shared: Arc<Shared>,
    cmd_tx: Sender<VideoCommand>,
    frame_rx: Receiver<(u64, Arc<FrameBuffer>)>,
    current: Option<Arc<FrameBuffer>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl VideoPlayer {
    /// Probe `path` and start decoding at a size whose larger side is at
    /// most `max_side`.
    ///
    /// # Errors
    /// Retourne une erreur si ffprobe échoue ou si le thread ne démarre pas.
    pub fn open(path: &Path, max_side: u32) -> Result<Self> {
        let info = probe_video(path)?;
        let (w, h) = pipe_size(info.width, info.height, max_side.max(2));

        let shared = Arc::new(Shared::default());
        let (frame_tx, frame_rx) = flume::bounded(CHANNEL_CAPACITY);
        let (cmd_tx, cmd_rx) = flume::unbounded();

        let decoder = Decoder {
            path: path.to_path_buf(),
            w,
            h,
            fps: info.fps,
            pos_secs: 0.0,
            epoch: 0,
            child: None,
            pool: (0..POOL_SIZE)
                .map(|_| Arc::new(FrameBuffer::new(w, h)))
                .collect(),
        };
        let thread_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("aimg-video".to_string())
            .spawn(move || {
                decode_loop(decoder, &frame_tx, &cmd_rx, &thread_shared);
                log::info!("Thread vidéo terminé.");
            })
            .context("Impossible de lancer le thread vidéo")?;

        Ok(Self {
            info,
            shared,
            cmd_tx,
            frame_rx,
            current: None,
            handle: Some(handle),
        })
    }

    /// Stream metadata.
    #[must_use]
    pub fn info(&self) -> VideoInfo {
        self.info
    }

    /// Playback position in seconds, as last reported by the decoder.
    #[must_use]
    pub fn position_secs(&self) -> f64 {
        self.shared.position_ms.load(Ordering::Relaxed) as f64 / 1000.0
    }

    pub fn play(&self) {
        self.shared.paused.store(false, Ordering::Release);
        self.send(VideoCommand::Play);
    }

    pub fn pause(&self) {
        self.shared.paused.store(true, Ordering::Release);
        self.send(VideoCommand::Pause);
    }

    /// Bascule lecture/pause. Retourne `true` si la vidéo est maintenant en pause.
    pub fn toggle_pause(&self) -> bool {
        if self.is_paused() {
            self.play();
            false
        } else {
            self.pause();
            true
        }
    }

    /// Jump by `delta` seconds. Clears the ended state.
    pub fn seek(&mut self, delta: f64) {
        self.new_epoch();
        self.send(VideoCommand::Seek(delta));
    }

    /// Restart from the beginning, including after the stream ended.
    pub fn replay(&mut self) {
        self.new_epoch();
        self.send(VideoCommand::Rewind);
    }

    fn new_epoch(&mut self) {
        self.shared.epoch.fetch_add(1, Ordering::AcqRel);
        self.shared.ended.store(false, Ordering::Release);
        self.current = None;
    }

    fn send(&self, cmd: VideoCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            log::warn!("Thread vidéo arrêté, commande {cmd:?} ignorée");
        }
    }
}

impl VideoSource for VideoPlayer {
    fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Acquire)
    }

    fn is_ended(&self) -> bool {
        self.shared.ended.load(Ordering::Acquire)
    }

    fn capture_frame(&mut self) -> Result<Arc<FrameBuffer>, CaptureError> {
        let epoch = self.shared.epoch.load(Ordering::Acquire);
        let mut disconnected = false;
        loop {
            match self.frame_rx.try_recv() {
                Ok((e, frame)) if e == epoch => self.current = Some(frame),
                Ok(_) => {}
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        if disconnected && !self.is_ended() {
            return Err(CaptureError::Fault(
                "le thread de décodage s'est arrêté".to_string(),
            ));
        }
        self.current.clone().ok_or_else(|| {
            CaptureError::Transient("aucune frame décodée pour l'instant".to_string())
        })
    }
}

impl Drop for VideoPlayer {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(VideoCommand::Quit);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_output_is_parsed() {
        let info = parse_probe("width=1280\nheight=720\nr_frame_rate=30000/1001\n").unwrap();
        assert_eq!((info.width, info.height), (1280, 720));
        assert!((info.fps - 29.97).abs() < 0.01);
    }

    #[test]
    fn probe_without_stream_is_none() {
        assert!(parse_probe("").is_none());
        assert!(parse_probe("width=0\nheight=0\n").is_none());
    }

    #[test]
    fn probe_missing_rate_defaults() {
        let info = parse_probe("width=2\nheight=2\n").unwrap();
        assert!((info.fps - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn pipe_size_is_even_and_bounded() {
        assert_eq!(pipe_size(1080, 1920, 640), (360, 640));
        assert_eq!(pipe_size(641, 481, 10_000), (640, 480));
        let (w, h) = pipe_size(3, 1, 1);
        assert_eq!((w % 2, h % 2), (0, 0));
    }

    #[test]
    fn read_exact_reports_eof() {
        let mut buf = [0u8; 4];
        assert!(read_exact_or_eof(&mut &[1u8, 2, 3, 4, 5][..], &mut buf).unwrap());
        assert_eq!(buf, [1, 2, 3, 4]);
        assert!(!read_exact_or_eof(&mut &[1u8, 2][..], &mut buf).unwrap());
    }

    #[test]
    fn pool_reuses_free_slots() {
        let mut pool = vec![Arc::new(FrameBuffer::new(2, 2))];
        let held = Arc::clone(&pool[0]);
        assert_eq!(find_or_create_slot(&mut pool, 2, 2), 1);
        drop(held);
        assert_eq!(find_or_create_slot(&mut pool, 2, 2), 0);
    }

    #[test]
    fn rewind_after_eof_clears_ended() {
        let mut dec = Decoder {
            path: PathBuf::from("absent.mp4"),
            w: 2,
            h: 2,
            fps: 24.0,
            pos_secs: 12.5,
            epoch: 0,
            child: None,
            pool: Vec::new(),
        };
        let shared = Shared::default();
        shared.ended.store(true, Ordering::Release);
        shared.epoch.store(3, Ordering::Release);

        let (cmd_tx, cmd_rx) = flume::unbounded();
        cmd_tx.send(VideoCommand::Rewind).unwrap();
        assert!(dec.process_commands(&cmd_rx, &shared));
        kill(&mut dec.child);

        assert!(!shared.ended.load(Ordering::Acquire));
        assert_eq!(shared.position_ms.load(Ordering::Relaxed), 0);
        assert_eq!(dec.epoch, 3);
    }
}
