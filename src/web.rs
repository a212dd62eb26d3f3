// Browser front-end: one page, one JSON endpoint doing the actual checking.

use crate::aggregator::Aggregator;
use crate::sources::MANUAL_SOURCES;
use crate::target::Target;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use warp::http::StatusCode;
use warp::{Filter, Reply};

#[derive(Debug, Serialize)]
struct StatusMessage {
    status: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct CheckRequest {
    url: String,
}

#[derive(Debug, Serialize)]
struct SourceInfo {
    id: String,
    title: String,
    automatic: bool,
}

pub async fn start_web_server(aggregator: Aggregator, addr: SocketAddr) {
    let aggregator = Arc::new(aggregator);
    let aggregator_filter = warp::any().map(move || aggregator.clone());

    let index = warp::get()
        .and(warp::path::end())
        .map(|| warp::reply::html(index_html()));

    let check = warp::post()
        .and(warp::path("check"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(aggregator_filter.clone())
        .and_then(check_url);

    let sources = warp::get()
        .and(warp::path("sources"))
        .and(warp::path::end())
        .and(aggregator_filter.clone())
        .map(|aggregator: Arc<Aggregator>| warp::reply::json(&list_sources(&aggregator)));

    let routes = index.or(check).or(sources);

    info!("Web interface running on http://{}", addr);
    println!("Web interface running on http://{}", addr);
    warp::serve(routes).run(addr).await;
}

async fn check_url(
    request: CheckRequest,
    aggregator: Arc<Aggregator>,
) -> Result<warp::reply::Response, warp::Rejection> {
    let target = match Target::from_input(&request.url) {
        Ok(target) => target,
        Err(e) => {
            warn!("Rejected input {:?}: {}", request.url, e);
            let body = warp::reply::json(&StatusMessage {
                status: "error".to_string(),
                message: e.to_string(),
            });
            return Ok(warp::reply::with_status(body, StatusCode::BAD_REQUEST).into_response());
        }
    };

    let outcome = aggregator.run(&target).await;
    Ok(warp::reply::json(&outcome).into_response())
}

fn list_sources(aggregator: &Aggregator) -> Vec<SourceInfo> {
    let automatic = aggregator.sources().map(|s| SourceInfo {
        id: s.id().to_string(),
        title: s.title().to_string(),
        automatic: true,
    });
    let manual = MANUAL_SOURCES.iter().map(|(id, title, _)| SourceInfo {
        id: id.to_string(),
        title: title.to_string(),
        automatic: false,
    });
    automatic.chain(manual).collect()
}

fn index_html() -> String {
    r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>OA Finder</title>
    <style>
        body { font-family: Arial; margin: 20px; background: #f5f5f5; min-height: 100vh; display: flex; flex-direction: column; }
        .content { flex: 1; max-width: 900px; }
        h1 { color: #333; }

        .status-message { padding: 10px; margin: 10px 0; display: none; }
        .status-message.error { background: #f8d7da; color: #721c24; border: 1px solid #f5c6cb; }

        .search-form { background: white; padding: 20px; }
        .search-form input[type="text"] { width: 100%; box-sizing: border-box; padding: 8px; margin: 5px 0 10px 0; }

        button { padding: 8px 16px; background: rgb(100, 149, 237); color: white; border: none; cursor: pointer; border-radius: 0; }
        button:hover { background: #5a8dd4; }
        button:disabled { background: #999; cursor: default; }

        .loading { display: none; padding: 10px; background: #fff3cd; border: 1px solid #ffc107; margin: 10px 0; }
        .loading.active { display: block; }

        .target { margin: 15px 0; color: #666; font-size: 14px; }
        .doi-badge { background: #28a745; color: white; padding: 3px 8px; font-size: 12px; font-family: monospace; }
        .counts { margin: 10px 0; font-weight: bold; }

        .result { background: white; padding: 15px; margin: 10px 0; border: 1px solid #ddd; }
        .result h3 { margin: 0 0 8px 0; }
        .result a { color: #007bff; text-decoration: none; }
        .result a:hover { text-decoration: underline; }
        .result ul { margin: 8px 0 0 0; padding-left: 20px; }
        .summary { color: #444; font-size: 14px; }

        .badge { display: inline-block; padding: 2px 6px; font-size: 11px; margin-left: 10px; vertical-align: middle; }
        .badge.working { background: #d4edda; color: #155724; }
        .badge.not_working { background: #f8d7da; color: #721c24; }
        .badge.unknown { background: #fff3cd; color: #856404; }
    </style>
</head>
<body>
    <div class="content">
        <h1>OA Finder</h1>
        <p>Paste an article URL to look for legal, freely readable copies.</p>

        <div class="search-form">
            <label for="url"><b>Article URL:</b></label>
            <input type="text" id="url" placeholder="e.g. https://doi.org/10.1038/..." onkeydown="if (event.key === 'Enter') runCheck()">
            <button id="check-button" onclick="runCheck()">Find open copies</button>
        </div>

        <div id="status-message" class="status-message error"></div>
        <div id="loading" class="loading">Checking sources...</div>

        <div id="target" class="target"></div>
        <div id="counts" class="counts"></div>
        <div id="results"></div>
    </div>

    <script>
        const LABELS = { working: 'Working', not_working: 'Not worked', unknown: 'Unknown' };
        let latestSubmission = 0;

        function escapeHtml(text) {
            const div = document.createElement('div');
            div.textContent = text;
            return div.innerHTML;
        }

        function showError(message) {
            const element = document.getElementById('status-message');
            element.textContent = message;
            element.style.display = message ? 'block' : 'none';
        }

        function clearResults() {
            ['target', 'counts', 'results'].forEach(id => document.getElementById(id).innerHTML = '');
        }

        function runCheck() {
            const url = document.getElementById('url').value;
            const button = document.getElementById('check-button');
            const submission = ++latestSubmission;

            showError('');
            clearResults();
            button.disabled = true;
            document.getElementById('loading').classList.add('active');

            fetch('/check', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify({ url: url })
            })
            .then(r => r.json())
            .then(data => {
                // A newer submission owns the page now
                if (submission !== latestSubmission) return;
                if (data.status === 'error') {
                    showError(data.message);
                    return;
                }
                renderOutcome(data);
            })
            .catch(err => {
                if (submission === latestSubmission) showError('Something went wrong: ' + err);
            })
            .finally(() => {
                if (submission !== latestSubmission) return;
                button.disabled = false;
                document.getElementById('loading').classList.remove('active');
            });
        }

        function renderOutcome(data) {
            clearResults();
            const doi = data.target.doi
                ? ` <span class="doi-badge">${escapeHtml(data.target.doi)}</span>`
                : '';
            document.getElementById('target').innerHTML =
                `Checked <a href="${escapeHtml(data.target.url)}" target="_blank">${escapeHtml(data.target.url)}</a>${doi}`;

            document.getElementById('counts').textContent =
                `${data.counts.working} working, ${data.counts.not_working} not worked, ${data.counts.unknown} unknown`;

            const container = document.getElementById('results');
            data.results.forEach(result => {
                const div = document.createElement('div');
                div.className = 'result';

                const links = result.links.map(link =>
                    `<li><a href="${escapeHtml(link.href)}" target="_blank" rel="noopener">${escapeHtml(link.label)}</a></li>`
                ).join('');

                div.innerHTML = `
                    <h3>${escapeHtml(result.title)}<span class="badge ${result.status}">${LABELS[result.status]}</span></h3>
                    <div class="summary">${escapeHtml(result.summary)}</div>
                    ${links ? `<ul>${links}</ul>` : ''}
                `;
                container.appendChild(div);
            });
        }
    </script>
</body>
</html>"#
        .to_string()
}
