//! Document sources the loopback engine can load without a network.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::trace;
use url::Url;

use crate::error::{Error, Result};

/// Loads the text of `url`.
///
/// - `about:blank` is empty
/// - `data:` URLs carry their content inline, percent-encoded and optionally `;base64`
/// - `file:` URLs are read from disk
///
/// Other schemes yield [`Error::UnsupportedScheme`].
pub fn resolve(url: &str) -> Result<String> {
	let parsed = Url::parse(url).map_err(|err| invalid(url, err.to_string()))?;
	trace!(scheme = parsed.scheme(), "resolving document");

	match parsed.scheme() {
		"about" => Ok(String::new()),
		"data" => data_url(url, &parsed),
		"file" => {
			let path = parsed
				.to_file_path()
				.map_err(|()| invalid(url, "not a local path".into()))?;
			let bytes = std::fs::read(&path)?;
			Ok(String::from_utf8_lossy(&bytes).into_owned())
		}
		other => Err(Error::UnsupportedScheme(other.to_string())),
	}
}

fn data_url(url: &str, parsed: &Url) -> Result<String> {
	let body = &parsed.as_str()["data:".len()..];
	let body = body.split_once('#').map_or(body, |(body, _)| body);
	let (meta, content) = body
		.split_once(',')
		.ok_or_else(|| invalid(url, "missing ',' in data URL".into()))?;

	let content = urlencoding::decode_binary(content.as_bytes());
	if meta.ends_with(";base64") {
		let bytes = STANDARD
			.decode(content.trim_ascii())
			.map_err(|err| invalid(url, err.to_string()))?;
		Ok(String::from_utf8_lossy(&bytes).into_owned())
	} else {
		Ok(String::from_utf8_lossy(&content).into_owned())
	}
}

fn invalid(url: &str, reason: String) -> Error {
	Error::InvalidUrl {
		url: url.to_string(),
		reason,
	}
}
