use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::outline::{extract_outline_with, OutlineOptions};
use crate::read::cache::OutlineCache;
use crate::stats::document_stats;
use crate::toc::{self, TocFormat};

/// MCP server over stdio. Three tools:
/// - `outline_read`  → table of contents for a file
/// - `outline_text`  → table of contents for inline markdown
/// - `outline_stats` → word count, reading time, heading and code block counts
pub fn run(config: &Config) -> io::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    log::info!("mcp server listening on stdio");
    serve(stdin.lock(), stdout.lock(), &OutlineCache::new(), config)
}

/// Request loop: one JSON-RPC message per line until EOF.
/// Bad lines (invalid UTF-8 or JSON) get a -32700 reply and the loop goes on.
fn serve(
    mut reader: impl BufRead,
    mut writer: impl Write,
    cache: &OutlineCache,
    config: &Config,
) -> io::Result<()> {
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(l) => l.trim_end_matches(['\n', '\r']),
            Err(e) => {
                log::warn!("request is not utf-8: {e}");
                write_error(&mut writer, None, -32700, &format!("parse error: {e}"))?;
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }

        let req: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("unparsable request: {e}");
                write_error(&mut writer, None, -32700, &format!("parse error: {e}"))?;
                continue;
            }
        };

        // Notifications have no id; no response is sent
        if req.id.is_none() {
            log::debug!("notification {}", req.method);
            continue;
        }

        let response = handle_request(&req, cache, config);
        serde_json::to_writer(&mut writer, &response)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }

    Ok(())
}

#[derive(Deserialize)]
struct JsonRpcRequest {
    #[serde(rename = "jsonrpc")]
    _jsonrpc: String,
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

impl JsonRpcResponse {
    fn ok(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }
}

fn handle_request(req: &JsonRpcRequest, cache: &OutlineCache, config: &Config) -> JsonRpcResponse {
    match req.method.as_str() {
        "initialize" => JsonRpcResponse::ok(
            req.id.clone(),
            serde_json::json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": "mdoutline",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        ),

        "tools/list" => JsonRpcResponse::ok(
            req.id.clone(),
            serde_json::json!({
                "tools": tool_definitions()
            }),
        ),

        "tools/call" => handle_tool_call(req, cache, config),

        "ping" => JsonRpcResponse::ok(req.id.clone(), serde_json::json!({})),

        _ => JsonRpcResponse {
            jsonrpc: "2.0",
            id: req.id.clone(),
            result: None,
            error: Some(JsonRpcError {
                code: -32601,
                message: format!("method not found: {}", req.method),
            }),
        },
    }
}

// ---------------------------------------------------------------------------
// Tool dispatch
// ---------------------------------------------------------------------------

/// Execute a tool by name with the given arguments. Returns formatted output or error string.
pub(crate) fn dispatch_tool(
    tool: &str,
    args: &Value,
    cache: &OutlineCache,
    config: &Config,
) -> Result<String, String> {
    match tool {
        "outline_read" => tool_read(args, cache, config),
        "outline_text" => tool_text(args, config),
        "outline_stats" => tool_stats(args, cache, config),
        _ => Err(format!("unknown tool: {tool}")),
    }
}

/// Per-call settings: arguments override the server's config.
struct CallSettings {
    opts: OutlineOptions,
    format: TocFormat,
    raw_ids: bool,
}

fn call_settings(args: &Value, config: &Config) -> Result<CallSettings, String> {
    let format = match args.get("format").and_then(|v| v.as_str()) {
        Some(name) => TocFormat::parse(name)
            .ok_or_else(|| format!("unknown format: {name}. Use: text, markdown, json"))?,
        None => config.format,
    };
    let max_depth = args
        .get("max_depth")
        .and_then(serde_json::Value::as_u64)
        .map_or(config.max_depth, |d| u8::try_from(d).unwrap_or(u8::MAX));
    let raw_ids = args
        .get("raw_ids")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(config.raw_ids);
    Ok(CallSettings {
        opts: OutlineOptions { max_depth },
        format,
        raw_ids,
    })
}

fn tool_read(args: &Value, cache: &OutlineCache, config: &Config) -> Result<String, String> {
    let path_str = args.get("path").and_then(|v| v.as_str())
        .ok_or("missing required parameter: path")?;
    let path = PathBuf::from(path_str);
    let settings = call_settings(args, config)?;

    let doc = cache.load(&path).map_err(|e| e.to_string())?;
    let headings = doc.headings(&settings.opts);
    let entries = crate::toc_entries(&headings, settings.raw_ids);
    let body = toc::render(&entries, settings.format);

    if settings.format == TocFormat::Json {
        return Ok(body);
    }
    let header = toc::document_header(&path, &doc.stats(&settings.opts, config.words_per_minute));
    Ok(format!("{header}\n\n{body}"))
}

fn tool_text(args: &Value, config: &Config) -> Result<String, String> {
    let markdown = args.get("markdown").and_then(|v| v.as_str())
        .ok_or("missing required parameter: markdown")?;
    let settings = call_settings(args, config)?;

    let headings = extract_outline_with(markdown, &settings.opts);
    let entries = crate::toc_entries(&headings, settings.raw_ids);
    Ok(toc::render(&entries, settings.format))
}

fn tool_stats(args: &Value, cache: &OutlineCache, config: &Config) -> Result<String, String> {
    let stats = match args.get("path").and_then(|v| v.as_str()) {
        Some(p) => {
            let doc = cache.load(&PathBuf::from(p)).map_err(|e| e.to_string())?;
            doc.stats(&config.outline_options(), config.words_per_minute)
        }
        None => {
            let markdown = args.get("markdown").and_then(|v| v.as_str())
                .ok_or("missing required parameter: path or markdown")?;
            document_stats(markdown, &config.outline_options(), config.words_per_minute)
        }
    };
    serde_json::to_string_pretty(&stats).map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// MCP tool call handler
// ---------------------------------------------------------------------------

fn handle_tool_call(req: &JsonRpcRequest, cache: &OutlineCache, config: &Config) -> JsonRpcResponse {
    let params = &req.params;
    let tool_name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
    let args = params.get("arguments").unwrap_or(&Value::Null);

    match dispatch_tool(tool_name, args, cache, config) {
        Ok(output) => JsonRpcResponse::ok(
            req.id.clone(),
            serde_json::json!({
                "content": [{
                    "type": "text",
                    "text": output
                }]
            }),
        ),
        Err(e) => {
            log::debug!("tool {tool_name} failed: {e}");
            JsonRpcResponse::ok(
                req.id.clone(),
                serde_json::json!({
                    "content": [{
                        "type": "text",
                        "text": e
                    }],
                    "isError": true
                }),
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Tool definitions
// ---------------------------------------------------------------------------

fn tool_definitions() -> Vec<Value> {
    let format = serde_json::json!({
        "type": "string",
        "enum": ["text", "markdown", "json"],
        "default": "text",
        "description": "text: [line] indented headings. markdown: nested list of #anchor links. json: entry array."
    });
    let max_depth = serde_json::json!({
        "type": "number",
        "default": 4,
        "description": "Deepest heading level to include (1-4)."
    });
    let raw_ids = serde_json::json!({
        "type": "boolean",
        "default": false,
        "description": "Report raw slugs; skips de-duplication and positional fallbacks."
    });

    vec![
        serde_json::json!({
            "name": "outline_read",
            "description": "Table of contents for a Markdown file. Headings inside fenced code blocks are ignored; levels 5 and 6 are never included. Anchors are unique per document.",
            "inputSchema": {
                "type": "object",
                "required": ["path"],
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Absolute or relative path to a Markdown file."
                    },
                    "format": format,
                    "max_depth": max_depth,
                    "raw_ids": raw_ids
                }
            }
        }),
        serde_json::json!({
            "name": "outline_text",
            "description": "Table of contents for Markdown passed inline.",
            "inputSchema": {
                "type": "object",
                "required": ["markdown"],
                "properties": {
                    "markdown": {
                        "type": "string",
                        "description": "Markdown document text."
                    },
                    "format": format,
                    "max_depth": max_depth,
                    "raw_ids": raw_ids
                }
            }
        }),
        serde_json::json!({
            "name": "outline_stats",
            "description": "Word count, estimated reading minutes, heading count and code block count for a file or inline Markdown.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Markdown file. Takes precedence over `markdown`."
                    },
                    "markdown": {
                        "type": "string",
                        "description": "Markdown document text."
                    }
                }
            }
        }),
    ]
}

fn write_error(w: &mut impl Write, id: Option<Value>, code: i32, msg: &str) -> io::Result<()> {
    let resp = JsonRpcResponse {
        jsonrpc: "2.0",
        id,
        result: None,
        error: Some(JsonRpcError {
            code,
            message: msg.into(),
        }),
    };
    serde_json::to_writer(&mut *w, &resp)?;
    w.write_all(b"\n")?;
    w.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(method: &str, params: Value) -> JsonRpcRequest {
        serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params
        }))
        .unwrap()
    }

    fn call(tool: &str, args: Value) -> Value {
        let req = request("tools/call", json!({ "name": tool, "arguments": args }));
        let resp = handle_request(&req, &OutlineCache::new(), &Config::default());
        serde_json::to_value(resp).unwrap()
    }

    fn serve_lines(input: &[u8]) -> Vec<Value> {
        let mut out = Vec::new();
        serve(input, &mut out, &OutlineCache::new(), &Config::default()).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn invalid_utf8_line_does_not_stop_server() {
        let mut input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"x\xff\"}\n".to_vec();
        input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n");
        let replies = serve_lines(&input);
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["error"]["code"], -32700);
        assert_eq!(replies[1]["id"], 2);
        assert!(replies[1]["result"].is_object());
    }

    #[test]
    fn bad_json_then_notification_then_request() {
        let input = b"not json\r\n\n{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"ping\"}";
        let replies = serve_lines(input);
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["error"]["code"], -32700);
        assert_eq!(replies[1]["id"], 7);
    }

    #[test]
    fn initialize_reports_server() {
        let resp = handle_request(&request("initialize", Value::Null), &OutlineCache::new(), &Config::default());
        let v = serde_json::to_value(resp).unwrap();
        assert_eq!(v["result"]["serverInfo"]["name"], "mdoutline");
    }

    #[test]
    fn lists_three_tools() {
        let resp = handle_request(&request("tools/list", Value::Null), &OutlineCache::new(), &Config::default());
        let v = serde_json::to_value(resp).unwrap();
        let names: Vec<&str> = v["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["outline_read", "outline_text", "outline_stats"]);
    }

    #[test]
    fn unknown_method() {
        let resp = handle_request(&request("nope", Value::Null), &OutlineCache::new(), &Config::default());
        let v = serde_json::to_value(resp).unwrap();
        assert_eq!(v["error"]["code"], -32601);
        assert!(v.get("result").is_none());
    }

    #[test]
    fn outline_text_markdown_format() {
        let v = call(
            "outline_text",
            json!({ "markdown": "# A\n```\n# B\n```\n# A", "format": "markdown" }),
        );
        assert_eq!(
            v["result"]["content"][0]["text"],
            "- [A](#a)\n- [A](#a-2)"
        );
    }

    #[test]
    fn outline_text_raw_ids_json() {
        let v = call(
            "outline_text",
            json!({ "markdown": "# A\n# A\n## B", "format": "json", "raw_ids": true, "max_depth": 1 }),
        );
        let text = v["result"]["content"][0]["text"].as_str().unwrap();
        let entries: Vec<crate::TocEntry> = serde_json::from_str(text).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.anchor == "a"));
    }

    #[test]
    fn tool_errors_are_content() {
        let v = call("outline_text", json!({}));
        assert_eq!(v["result"]["isError"], true);
        assert!(v.get("error").is_none());

        let v = call("outline_text", json!({ "markdown": "# x", "format": "yaml" }));
        assert_eq!(v["result"]["isError"], true);
    }

    #[test]
    fn unknown_tool() {
        let v = call("outline_delete", json!({}));
        assert_eq!(v["result"]["content"][0]["text"], "unknown tool: outline_delete");
    }

    #[test]
    fn read_file_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eip.md");
        std::fs::write(&path, "# Abstract\n## Motivation\n").unwrap();
        let v = call("outline_read", json!({ "path": path.to_str().unwrap() }));
        let text = v["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("# "));
        assert!(text.contains("(2 headings, ~1 min read)"));
        assert!(text.ends_with("[1] Abstract\n[2]   Motivation"));
    }

    #[test]
    fn stats_inline() {
        let v = call("outline_stats", json!({ "markdown": "# T\none two\n```\nx\n```" }));
        let text = v["result"]["content"][0]["text"].as_str().unwrap();
        let stats: Value = serde_json::from_str(text).unwrap();
        assert_eq!(stats["headings"], 1);
        assert_eq!(stats["code_blocks"], 1);
        assert_eq!(stats["words"], 7);
    }
}
