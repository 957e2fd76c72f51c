//! Browser process management.
//!
//! Locates a Chromium-family executable, launches it with remote debugging
//! on a free loopback port, and discovers the browser-level WebSocket URL via
//! the DevTools HTTP endpoint (`/json/version`).

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use chatpoll_protocol::VersionInfo;
use tempfile::TempDir;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Environment variable overriding executable discovery.
pub const BROWSER_ENV: &str = "CHATPOLL_BROWSER";

const PROBE_INTERVAL: Duration = Duration::from_millis(200);

/// Options for [`BrowserProcess::launch`].
#[derive(Debug, Clone)]
pub struct LaunchOptions {
	/// Explicit executable; discovery is skipped when set.
	pub executable: Option<PathBuf>,
	pub headless: bool,
	/// Extra command-line flags appended after the defaults.
	pub args: Vec<String>,
	/// How long to wait for the DevTools endpoint to come up.
	pub startup_timeout: Duration,
}

impl Default for LaunchOptions {
	fn default() -> Self {
		Self {
			executable: None,
			headless: true,
			args: Vec::new(),
			startup_timeout: Duration::from_secs(20),
		}
	}
}

/// A browser process launched by chatpoll.
///
/// The process is killed when this value is dropped, and its throwaway
/// profile directory is removed.
#[derive(Debug)]
pub struct BrowserProcess {
	child: Child,
	ws_url: String,
	port: u16,
	_profile: TempDir,
}

impl BrowserProcess {
	/// Launches a browser and waits for its DevTools endpoint.
	pub async fn launch(options: &LaunchOptions) -> Result<Self> {
		let executable = find_executable(options.executable.as_deref())?;
		let profile = tempfile::Builder::new().prefix("chatpoll-profile-").tempdir()?;
		let port = free_port()?;
		let args = launch_args(port, profile.path(), options.headless, &options.args);

		debug!(
			target = "chatpoll",
			executable = %executable.display(),
			port,
			headless = options.headless,
			"launching browser"
		);

		let mut child = Command::new(&executable)
			.args(&args)
			.stdin(Stdio::null())
			.stdout(Stdio::null())
			.stderr(Stdio::null())
			.kill_on_drop(true)
			.spawn()
			.map_err(|e| Error::LaunchFailed(format!("{}: {e}", executable.display())))?;

		let base = format!("http://127.0.0.1:{port}");
		let deadline = Instant::now() + options.startup_timeout;
		let mut last_error = "endpoint not reachable".to_string();

		while Instant::now() < deadline {
			tokio::time::sleep(PROBE_INTERVAL).await;

			if let Some(status) = child.try_wait()? {
				return Err(Error::LaunchFailed(format!(
					"browser exited before the DevTools endpoint came up (status: {status})"
				)));
			}

			match fetch_version(&base).await {
				Ok(info) => {
					debug!(
						target = "chatpoll",
						browser = info.browser.as_deref().unwrap_or("unknown"),
						ws = %info.web_socket_debugger_url,
						"browser ready"
					);
					return Ok(Self {
						child,
						ws_url: info.web_socket_debugger_url,
						port,
						_profile: profile,
					});
				}
				Err(e) => last_error = e.to_string(),
			}
		}

		let _ = child.kill().await;
		Err(Error::LaunchFailed(format!(
			"DevTools endpoint on port {port} not available after {}ms: {last_error}",
			options.startup_timeout.as_millis()
		)))
	}

	/// Browser-level WebSocket URL.
	pub fn ws_url(&self) -> &str {
		&self.ws_url
	}

	/// Remote debugging port.
	pub fn port(&self) -> u16 {
		self.port
	}

	/// Waits up to `grace` for the process to exit on its own, then kills it.
	pub async fn shutdown(mut self, grace: Duration) -> Result<()> {
		match tokio::time::timeout(grace, self.child.wait()).await {
			Ok(status) => {
				debug!(target = "chatpoll", status = ?status.ok(), "browser exited");
			}
			Err(_) => {
				warn!(target = "chatpoll", "browser did not exit in time; killing");
				self.child.kill().await?;
			}
		}
		Ok(())
	}
}

/// Resolves a user-supplied endpoint to a browser WebSocket URL.
///
/// `ws://` and `wss://` URLs are used as-is; `http(s)://` base URLs are
/// resolved through `/json/version`.
pub async fn resolve_endpoint(endpoint: &str) -> Result<String> {
	if endpoint.starts_with("ws://") || endpoint.starts_with("wss://") {
		return Ok(endpoint.to_string());
	}
	if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
		return Ok(fetch_version(endpoint).await?.web_socket_debugger_url);
	}
	Err(Error::EndpointUnavailable {
		endpoint: endpoint.to_string(),
		reason: "expected a ws://, wss://, http:// or https:// URL".into(),
	})
}

/// Fetches `/json/version` from a DevTools HTTP endpoint.
pub async fn fetch_version(base_url: &str) -> Result<VersionInfo> {
	let url = format!("{}/json/version", base_url.trim_end_matches('/'));
	let unavailable = |reason: String| Error::EndpointUnavailable {
		endpoint: base_url.to_string(),
		reason,
	};

	let client = reqwest::Client::builder()
		.timeout(Duration::from_millis(800))
		.build()
		.map_err(|e| unavailable(e.to_string()))?;
	let response = client.get(&url).send().await.map_err(|e| unavailable(e.to_string()))?;
	if !response.status().is_success() {
		return Err(unavailable(format!("unexpected status {}", response.status())));
	}
	response
		.json::<VersionInfo>()
		.await
		.map_err(|e| unavailable(format!("bad /json/version body: {e}")))
}

/// Finds a Chromium-family executable.
///
/// Search order: explicit path, [`BROWSER_ENV`], well-known command names on
/// `PATH`, then well-known absolute install locations.
pub fn find_executable(explicit: Option<&Path>) -> Result<PathBuf> {
	if let Some(path) = explicit {
		return resolve_candidate(path).ok_or_else(|| Error::LaunchFailed(format!("executable not found: {}", path.display())));
	}

	if let Some(path) = std::env::var_os(BROWSER_ENV).filter(|v| !v.is_empty()) {
		let path = PathBuf::from(path);
		match resolve_candidate(&path) {
			Some(found) => return Ok(found),
			None => warn!(target = "chatpoll", path = %path.display(), "{BROWSER_ENV} does not point to an executable"),
		}
	}

	candidate_names()
		.iter()
		.find_map(|candidate| resolve_candidate(Path::new(candidate)))
		.ok_or(Error::ExecutableNotFound)
}

fn resolve_candidate(path: &Path) -> Option<PathBuf> {
	if path.is_absolute() || path.components().count() > 1 {
		return path.exists().then(|| path.to_path_buf());
	}
	which::which(path).ok()
}

fn candidate_names() -> &'static [&'static str] {
	if cfg!(target_os = "macos") {
		&[
			"/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
			"/Applications/Chromium.app/Contents/MacOS/Chromium",
			"/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
			"/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
		]
	} else if cfg!(target_os = "windows") {
		&[
			r"C:\Program Files\Google\Chrome\Application\chrome.exe",
			r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
			r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
			r"C:\Program Files\Chromium\Application\chrome.exe",
		]
	} else {
		&[
			"chromium",
			"chromium-browser",
			"google-chrome-stable",
			"google-chrome",
			"brave-browser",
			"microsoft-edge",
			"/usr/bin/chromium",
			"/usr/bin/chromium-browser",
			"/usr/bin/google-chrome-stable",
			"/snap/bin/chromium",
		]
	}
}

/// Picks a currently free loopback port.
fn free_port() -> Result<u16> {
	let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
	Ok(listener.local_addr()?.port())
}

/// Command-line flags for a fresh, isolated browser instance.
fn launch_args(port: u16, profile: &Path, headless: bool, extra: &[String]) -> Vec<String> {
	let mut args = vec![
		format!("--remote-debugging-port={port}"),
		"--remote-debugging-address=127.0.0.1".to_string(),
		format!("--user-data-dir={}", profile.display()),
		"--no-first-run".to_string(),
		"--no-default-browser-check".to_string(),
		"--disable-background-networking".to_string(),
		"--disable-popup-blocking".to_string(),
		"--disable-blink-features=AutomationControlled".to_string(),
	];
	if headless {
		args.push("--headless=new".to_string());
		args.push("--hide-scrollbars".to_string());
		args.push("--mute-audio".to_string());
	}
	args.extend(extra.iter().cloned());
	args.push("about:blank".to_string());
	args
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn launch_args_enable_debugging_on_port() {
		let args = launch_args(9333, Path::new("/tmp/profile"), true, &[]);
		assert!(args.contains(&"--remote-debugging-port=9333".to_string()));
		assert!(args.contains(&"--user-data-dir=/tmp/profile".to_string()));
		assert!(args.contains(&"--headless=new".to_string()));
		assert_eq!(args.last().map(String::as_str), Some("about:blank"));
	}

	#[test]
	fn headed_launch_omits_headless_flags() {
		let args = launch_args(9333, Path::new("/tmp/profile"), false, &["--lang=zh-CN".to_string()]);
		assert!(!args.iter().any(|a| a.starts_with("--headless")));
		assert!(args.contains(&"--lang=zh-CN".to_string()));
	}

	#[test]
	fn explicit_missing_executable_is_reported() {
		let err = find_executable(Some(Path::new("/definitely/not/a/browser"))).unwrap_err();
		assert!(matches!(err, Error::LaunchFailed(msg) if msg.contains("/definitely/not/a/browser")));
	}

	#[test]
	fn explicit_existing_path_is_accepted() {
		let dir = tempfile::tempdir().unwrap();
		let fake = dir.path().join("chrome");
		std::fs::write(&fake, b"").unwrap();
		assert_eq!(find_executable(Some(&fake)).unwrap(), fake);
	}

	#[test]
	fn free_port_is_nonzero() {
		assert_ne!(free_port().unwrap(), 0);
	}

	#[tokio::test]
	async fn websocket_endpoints_pass_through() {
		let url = "ws://127.0.0.1:9222/devtools/browser/abc";
		assert_eq!(resolve_endpoint(url).await.unwrap(), url);
	}

	#[tokio::test]
	async fn unsupported_endpoint_scheme_is_rejected() {
		let err = resolve_endpoint("127.0.0.1:9222").await.unwrap_err();
		assert!(matches!(err, Error::EndpointUnavailable { .. }));
	}

	#[tokio::test]
	async fn unreachable_http_endpoint_is_unavailable() {
		let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
		let port = listener.local_addr().unwrap().port();
		drop(listener);

		let err = fetch_version(&format!("http://127.0.0.1:{port}")).await.unwrap_err();
		assert!(matches!(err, Error::EndpointUnavailable { .. }));
	}
}
