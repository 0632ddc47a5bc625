use anyhow::Result;
use futures::StreamExt;
use reqwest::Response;

use super::buffering::CircularLineBuffer;
use crate::streaming::{EventStream, StreamEvent};

/// Strategy pattern for parsing vendor-specific SSE payloads
pub trait SseLineParser: Send {
    /// Parse a data line into stream events
    fn parse_data_line(&self, data: &str) -> Result<Vec<StreamEvent>>;
    
    /// Check if this line signals end of stream
    fn is_done_marker(&self, data: &str) -> bool {
        data == "[DONE]"
    }
}

/// Generic SSE stream parser using circular buffer
/// Applies strategy pattern for different vendors
pub fn parse_sse_stream<P: SseLineParser + 'static>(
    response: Response,
    parser: P,
) -> EventStream {
    let stream = response.bytes_stream();
    
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(stream);
        let mut buffer = CircularLineBuffer::with_capacity(4096);
        
        'read: while let Some(chunk_result) = byte_chunks.next().await {
            match chunk_result {
                Ok(bytes) => {
                    buffer.extend(&bytes);
                    
                    // Process all complete lines in buffer
                    while let Some(line_result) = buffer.next_line() {
                        let line = match line_result {
                            Ok(line) => line,
                            Err(e) => {
                                yield Err(e);
                                break 'read;
                            }
                        };
                        
                        let Some(data) = line.strip_prefix("data:") else {
                            continue;
                        };
                        let data = data.trim_start();
                        
                        if parser.is_done_marker(data) {
                            break 'read;
                        }
                        
                        match parser.parse_data_line(data) {
                            Ok(events) => {
                                for event in events {
                                    yield Ok(event);
                                }
                            }
                            Err(e) => {
                                yield Err(e);
                                break 'read;
                            }
                        }
                    }
                }
                Err(e) => {
                    yield Err(anyhow::anyhow!("Stream error: {}", e));
                    break 'read;
                }
            }
        }
    })
}
