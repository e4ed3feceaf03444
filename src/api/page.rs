/// Single-page UI served at `/`. It posts the form to `/api/run` and renders
/// the JSON report.
pub(super) const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>loadblast</title>
<style>
  body { font-family: system-ui, sans-serif; background: #f3f4f6; color: #111827; margin: 0; }
  .container { max-width: 760px; margin: 3rem auto; background: #fff; padding: 2rem; border-radius: 10px; box-shadow: 0 4px 14px rgba(0,0,0,.08); }
  h1 { margin-top: 0; }
  .grid { display: grid; grid-template-columns: 1fr 1fr; gap: 1rem; }
  .full { grid-column: 1 / -1; }
  label { display: block; font-weight: 600; margin-bottom: .35rem; }
  input, select { width: 100%; box-sizing: border-box; padding: .55rem; border: 1px solid #d1d5db; border-radius: 6px; }
  button { margin-top: 1.5rem; width: 100%; padding: .8rem; font-size: 1rem; border: 0; border-radius: 6px; background: #dc2626; color: #fff; cursor: pointer; }
  button:disabled { background: #9ca3af; cursor: wait; }
  #output { display: none; margin-top: 1.5rem; white-space: pre; font-family: ui-monospace, monospace; background: #111827; color: #e5e7eb; padding: 1rem; border-radius: 6px; overflow-x: auto; }
  #output.error { color: #fca5a5; }
</style>
</head>
<body>
<div class="container">
  <h1>loadblast</h1>
  <p>Saturate an HTTP endpoint for a fixed time and report throughput, latency and status codes.</p>
  <div class="grid">
    <div class="full">
      <label for="url">Target URL</label>
      <input type="text" id="url" placeholder="https://example.com/api">
    </div>
    <div>
      <label for="method">Method</label>
      <select id="method">
        <option>GET</option><option>POST</option><option>PUT</option><option>DELETE</option><option>HEAD</option>
      </select>
    </div>
    <div>
      <label for="concurrency">Workers</label>
      <input type="number" id="concurrency" value="50" min="1">
    </div>
    <div>
      <label for="duration">Duration (s)</label>
      <input type="number" id="duration" value="10" min="1">
    </div>
    <div>
      <label for="timeout">Timeout (s)</label>
      <input type="number" id="timeout" value="5" min="1">
    </div>
  </div>
  <button id="run" onclick="startRun()">Start run</button>
  <div id="output"></div>
</div>
<script>
async function startRun() {
  const button = document.getElementById('run');
  const output = document.getElementById('output');
  const url = document.getElementById('url').value.trim();
  if (!url) { alert('Enter a target URL.'); return; }

  const payload = {
    target_url: url,
    method: document.getElementById('method').value,
    concurrency: parseInt(document.getElementById('concurrency').value, 10),
    duration: parseInt(document.getElementById('duration').value, 10),
    timeout: parseInt(document.getElementById('timeout').value, 10)
  };

  button.disabled = true;
  button.innerText = 'Running...';
  output.style.display = 'block';
  output.className = '';
  output.innerText = 'Running ' + payload.method + ' ' + url + ' for ' + payload.duration + 's...';

  try {
    const response = await fetch('/api/run', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify(payload)
    });
    const data = await response.json();
    if (!response.ok || data.error_msg) {
      output.className = 'error';
      output.innerText = 'Run failed: ' + (data.error_msg || response.statusText);
      return;
    }
    let text = '';
    text += 'Total requests : ' + data.total_requests.toLocaleString() + '\n';
    text += 'Successful     : ' + data.success.toLocaleString() + '\n';
    text += 'Errors         : ' + data.errors.toLocaleString() + '\n';
    text += 'Throughput     : ' + data.throughput_rps.toFixed(2) + ' req/s\n\n';
    text += 'Latency min    : ' + data.min_latency + '\n';
    text += 'Latency mean   : ' + data.mean_latency + '\n';
    text += 'Latency p50    : ' + data.p50_latency + '\n';
    text += 'Latency p90    : ' + data.p90_latency + '\n';
    text += 'Latency p99    : ' + data.p99_latency + '\n';
    text += 'Latency max    : ' + data.max_latency + '\n\n';
    text += 'Status codes\n';
    for (const [code, count] of Object.entries(data.status_codes)) {
      text += '  ' + code + ' : ' + count.toLocaleString() + '\n';
    }
    output.innerText = text;
  } catch (error) {
    output.className = 'error';
    output.innerText = 'Could not reach the server: ' + error.message;
  } finally {
    button.disabled = false;
    button.innerText = 'Start run';
  }
}
</script>
</body>
</html>
"#;
