//! Bounded response body reading.

/// Body bytes read from a response, capped at a byte limit.
#[derive(Debug, Clone, Default)]
pub struct CappedBody {
    pub text: String,
    /// More bytes followed than were kept
    pub truncated: bool,
}

/// Reads `response` chunk by chunk, keeping at most `limit` bytes.
///
/// Reading stops at the first chunk that crosses the limit; dropping the
/// response then closes the connection instead of draining it.
pub async fn read_capped(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<CappedBody, reqwest::Error> {
    let mut buf: Vec<u8> = Vec::new();
    let mut truncated = false;

    while let Some(chunk) = response.chunk().await? {
        let room = limit.saturating_sub(buf.len());
        if chunk.len() > room {
            buf.extend_from_slice(&chunk[..room]);
            truncated = true;
            break;
        }
        buf.extend_from_slice(&chunk);
    }

    if truncated {
        log::debug!("Response body exceeded {limit} bytes, truncated");
    }

    Ok(CappedBody {
        text: String::from_utf8_lossy(&buf).into_owned(),
        truncated,
    })
}
