use crate::models::CHANNEL_OPTIONS;
use axum::{
    response::Html,
    routing::get,
    Router,
};

pub fn ui_routes() -> Router {
    Router::new().route("/", get(campaign_page))
}

fn channel_checkboxes() -> String {
    CHANNEL_OPTIONS
        .iter()
        .map(|channel| {
            format!(
                r#"<label class="checkbox"><input type="checkbox" name="channels" value="{0}"> {0}</label>"#,
                channel
            )
        })
        .collect::<Vec<_>>()
        .join("\n                ")
}

pub async fn campaign_page() -> Html<String> {
    Html(PAGE_TEMPLATE.replace("{{CHANNELS}}", &channel_checkboxes()))
}

const PAGE_TEMPLATE: &str = r###"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>AdGen - AI Creative Generator</title>
    <style>
        * { box-sizing: border-box; }
        body { margin: 0; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #111827; color: #f3f4f6; }
        header, footer { padding: 1rem 2rem; background: #1f2937; }
        footer { text-align: center; color: #6b7280; font-size: 0.85rem; }
        main { display: grid; grid-template-columns: 1fr 1fr; gap: 2rem; padding: 2rem; align-items: start; }
        @media (max-width: 1000px) { main { grid-template-columns: 1fr; } }
        .card { background: #1f2937; border-radius: 10px; padding: 1.5rem; margin-bottom: 1.5rem; }
        label { display: block; font-size: 0.9rem; color: #d1d5db; margin: 1rem 0 0.3rem; }
        input[type=text], textarea { width: 100%; padding: 0.6rem; border-radius: 6px; border: 1px solid #4b5563; background: #111827; color: #f3f4f6; }
        textarea { min-height: 80px; }
        .checkbox { display: inline-flex; gap: 0.4rem; margin-right: 1rem; align-items: center; }
        .dropzone { border: 2px dashed #4b5563; border-radius: 8px; padding: 1.5rem; text-align: center; color: #9ca3af; cursor: pointer; }
        .dropzone.dragging { border-color: #6366f1; background: #1e1b4b; }
        .previews { display: flex; flex-wrap: wrap; gap: 0.8rem; margin-top: 0.8rem; }
        .preview { position: relative; width: 96px; height: 96px; }
        .preview img { width: 100%; height: 100%; object-fit: cover; border-radius: 6px; }
        .preview button { position: absolute; inset: 0; opacity: 0; background: rgba(0,0,0,0.6); color: white; border: none; border-radius: 6px; cursor: pointer; }
        .preview:hover button { opacity: 1; }
        button.primary { width: 100%; margin-top: 1.5rem; padding: 0.8rem; background: #4f46e5; color: white; border: none; border-radius: 6px; font-size: 1rem; cursor: pointer; }
        button.primary:disabled { opacity: 0.6; cursor: wait; }
        .tabs button { background: none; border: none; color: #9ca3af; padding: 0.5rem 1rem; cursor: pointer; border-bottom: 2px solid transparent; }
        .tabs button.active { color: white; border-color: #6366f1; }
        .error { color: #f87171; text-align: center; }
        pre { white-space: pre-wrap; word-break: break-word; background: #111827; padding: 1rem; border-radius: 6px; font-size: 0.8rem; }
        .scene { display: grid; grid-template-columns: 1fr 1fr; gap: 1rem; background: #111827; padding: 1rem; border-radius: 8px; margin: 0.8rem 0; }
        .scene .media { aspect-ratio: 16 / 9; background: #374151; border-radius: 6px; display: flex; flex-direction: column; gap: 0.5rem; align-items: center; justify-content: center; overflow: hidden; font-size: 0.8rem; color: #9ca3af; text-align: center; }
        .scene .media img, .scene .media video { width: 100%; height: 100%; object-fit: cover; }
        .scene button { background: #4f46e5; color: white; border: none; border-radius: 5px; padding: 0.4rem 0.8rem; cursor: pointer; }
        .muted { color: #9ca3af; font-size: 0.85rem; }
        h3 { color: #818cf8; }
    </style>
</head>
<body>
    <header><h1>AdGen</h1><span class="muted">Multimodal advertising creative generator</span></header>
    <main>
        <form id="campaignForm" class="card">
            <h2>Campaign Details</h2>

            <label for="productDescription">Product Description</label>
            <textarea id="productDescription" name="productDescription" required
                placeholder="e.g., An eco-friendly, solar-powered backpack for tech-savvy hikers."></textarea>

            <label>Product Images</label>
            <div class="dropzone" data-target="productImages">Upload files or drag and drop<br><small>PNG, JPG, GIF up to 10MB</small></div>
            <div class="previews" id="productImagesPreviews"></div>

            <label>Celebrity / Influencer Images (Optional)</label>
            <div class="dropzone" data-target="celebrityImages">Upload files or drag and drop<br><small>PNG, JPG, GIF up to 10MB</small></div>
            <div class="previews" id="celebrityImagesPreviews"></div>

            <label for="campaignGoals">Campaign Goals</label>
            <input type="text" id="campaignGoals" name="campaignGoals" required
                placeholder="e.g., Increase brand awareness among millennials, drive online sales by 20%.">

            <label for="brandGuidelines">Brand Guidelines (Optional)</label>
            <textarea id="brandGuidelines" name="brandGuidelines"
                placeholder="e.g., Use a minimalist and clean aesthetic. Primary color: #FFFFFF. Avoid playful fonts."></textarea>

            <label for="tone">Tone</label>
            <input type="text" id="tone" name="tone" required
                placeholder="e.g., Energetic and inspiring, luxurious and sophisticated, witty and humorous.">

            <label>Channels</label>
            <div>
                {{CHANNELS}}
            </div>

            <label for="regions">Target Regions (for localization)</label>
            <input type="text" id="regions" name="regions" required placeholder="e.g., North America, Japan, Brazil">

            <button type="submit" class="primary" id="submitButton">Generate Ad Package</button>
        </form>

        <section id="output">
            <div class="card"><h2>Welcome to AdGen</h2>
                <p class="muted">Fill out the form to generate a complete advertising package with storyboards, images, and video.</p>
            </div>
        </section>
    </main>
    <footer>AdGen - generated content may need human review before publishing.</footer>

    <script>
        const uploads = { productImages: [], celebrityImages: [] };
        // Generated videos live on the server until released
        const liveVideos = new Set();

        function releaseVideo(url) {
            if (!url || !liveVideos.delete(url)) return;
            fetch(url, { method: 'DELETE' });
        }
        const output = document.getElementById('output');

        function escapeHtml(value) {
            return String(value ?? '').replace(/[&<>"']/g, c => ({'&':'&amp;','<':'&lt;','>':'&gt;','"':'&quot;',"'":'&#39;'}[c]));
        }

        async function readError(response) {
            try { return (await response.json()).error || response.statusText; }
            catch (_) { return response.statusText; }
        }

        // Uploads and previews
        function renderPreviews(target) {
            const container = document.getElementById(target + 'Previews');
            container.innerHTML = '';
            uploads[target].forEach((file, index) => {
                const item = document.createElement('div');
                item.className = 'preview';
                item.innerHTML = `<img src="${file.preview_url}" alt="${escapeHtml(file.file_name)}"><button type="button" aria-label="Remove ${escapeHtml(file.file_name)}">Remove</button>`;
                item.querySelector('button').onclick = () => removeFile(target, index);
                container.appendChild(item);
            });
        }

        async function addFiles(target, files) {
            if (!files || files.length === 0) return;
            const formData = new FormData();
            for (const file of files) formData.append('files', file);
            const response = await fetch('/api/uploads', { method: 'POST', body: formData });
            if (!response.ok) { alert(await readError(response)); return; }
            uploads[target] = uploads[target].concat(await response.json());
            renderPreviews(target);
        }

        async function removeFile(target, index) {
            const [file] = uploads[target].splice(index, 1);
            renderPreviews(target);
            await fetch('/api/uploads/' + file.id, { method: 'DELETE' });
        }

        document.querySelectorAll('.dropzone').forEach(zone => {
            const target = zone.dataset.target;
            const input = document.createElement('input');
            input.type = 'file'; input.multiple = true; input.accept = 'image/*'; input.hidden = true;
            input.onchange = () => { addFiles(target, input.files); input.value = ''; };
            zone.appendChild(input);
            zone.onclick = () => input.click();
            zone.ondragenter = zone.ondragover = e => { e.preventDefault(); zone.classList.add('dragging'); };
            zone.ondragleave = e => { e.preventDefault(); zone.classList.remove('dragging'); };
            zone.ondrop = e => { e.preventDefault(); zone.classList.remove('dragging'); addFiles(target, e.dataTransfer.files); };
        });

        // Generation
        document.getElementById('campaignForm').onsubmit = async (e) => {
            e.preventDefault();
            const form = e.target;
            const button = document.getElementById('submitButton');
            if (button.disabled) return;

            const request = {
                productDescription: form.productDescription.value,
                productImages: uploads.productImages.map(f => f.id),
                celebrityImages: uploads.celebrityImages.map(f => f.id),
                campaignGoals: form.campaignGoals.value,
                brandGuidelines: form.brandGuidelines.value,
                tone: form.tone.value,
                channels: [...form.querySelectorAll('input[name=channels]:checked')].map(c => c.value),
                regions: form.regions.value,
            };

            button.disabled = true; button.textContent = 'Generating...';
            output.innerHTML = '<div class="card"><p>AdGen is thinking...</p><p class="muted">Crafting a new creative package. This might take a moment.</p></div>';
            try {
                const response = await fetch('/api/generate', {
                    method: 'POST', headers: { 'Content-Type': 'application/json' }, body: JSON.stringify(request)
                });
                if (!response.ok) throw new Error(await readError(response));
                renderPackage(await response.json());
            } catch (err) {
                output.innerHTML = `<div class="card error"><h3>Generation Failed</h3><p>${escapeHtml(err.message || 'An unknown error occurred.')}</p></div>`;
            } finally {
                button.disabled = false; button.textContent = 'Generate Ad Package';
            }
        };

        function list(items) {
            return '<ul>' + (items || []).map(i => `<li>${escapeHtml(i)}</li>`).join('') + '</ul>';
        }

        function renderPackage(pkg) {
            [...liveVideos].forEach(releaseVideo);
            output.innerHTML = `
                <div class="card tabs"><button class="active" data-tab="formatted">Formatted</button><button data-tab="json">JSON</button></div>
                <div id="tab-formatted"></div>
                <div id="tab-json" hidden><div class="card"><pre>${escapeHtml(JSON.stringify(pkg, null, 2))}</pre></div></div>`;
            output.querySelectorAll('.tabs button').forEach(tab => tab.onclick = () => {
                output.querySelectorAll('.tabs button').forEach(t => t.classList.toggle('active', t === tab));
                document.getElementById('tab-formatted').hidden = tab.dataset.tab !== 'formatted';
                document.getElementById('tab-json').hidden = tab.dataset.tab !== 'json';
            });

            const formatted = document.getElementById('tab-formatted');
            const brief = pkg.campaign_brief || {};
            formatted.innerHTML = `
                <div class="card"><h3>${escapeHtml(brief.title)}</h3><p>${escapeHtml(brief.hook)}</p>${list(brief.value_props)}</div>
                <div class="card"><h3>Audience & KPI</h3>
                    <p><strong>Age:</strong> ${escapeHtml(pkg.audience?.age_range)} &middot; <strong>Insight:</strong> ${escapeHtml(pkg.audience?.insight)}</p>
                    ${list(pkg.audience?.segments)}
                    <p><strong>${escapeHtml(pkg.kpi?.primary)}</strong>: ${escapeHtml(pkg.kpi?.goal)}</p></div>`;

            (pkg.variants || []).forEach(variant => {
                const card = document.createElement('div');
                card.className = 'card';
                card.innerHTML = `<h3>${escapeHtml(variant.channel)} &middot; ${escapeHtml(variant.aspect_ratio)} &middot; ${escapeHtml(variant.duration_s)}s</h3>
                    <p><strong>${escapeHtml(variant.copy?.headline)}</strong></p><p>${escapeHtml(variant.copy?.body)}</p>
                    <p><strong>${escapeHtml(variant.copy?.cta)}</strong></p>`;
                (variant.storyboard || []).forEach(scene => card.appendChild(renderScene(variant, scene)));
                formatted.appendChild(card);
            });

            const style = pkg.style_guide || {};
            formatted.insertAdjacentHTML('beforeend', `
                <div class="card"><h3>Style Guide</h3><p>Colors: ${escapeHtml((style.colors || []).join(', '))}</p>
                    <p>Typography: ${escapeHtml(style.typography)} &middot; Logo: ${escapeHtml(style.logo_placement)} &middot; Motion: ${escapeHtml(style.motion_easing)}</p></div>
                <div class="card"><h3>Production Checklist</h3>${list(pkg.production_checklist)}
                    <p class="muted">${escapeHtml(pkg.disclaimer_legal)}</p></div>`);
        }

        // Per-scene media; starting one kind clears the other's result.
        function renderScene(variant, scene) {
            const el = document.createElement('div');
            el.className = 'scene';
            el.innerHTML = `<div><strong>Scene ${escapeHtml(scene.scene_id)}</strong>
                    <p class="muted">Shot: ${escapeHtml(scene.shot_type)} | Camera: ${escapeHtml(scene.camera_move)} | ${escapeHtml(scene.duration_s)}s</p>
                    <p>${escapeHtml(scene.action)}</p><p class="muted">${escapeHtml(scene.dialogue_vo)}</p></div>
                <div class="media"></div>`;
            const media = el.querySelector('.media');
            const payload = { scene_id: `${variant.id}-${scene.scene_id}`, shot_type: scene.shot_type, action: scene.action, camera_move: scene.camera_move };
            let videoUrl = null;

            function clearVideo() {
                releaseVideo(videoUrl);
                videoUrl = null;
            }

            function showButtons() {
                clearVideo();
                media.innerHTML = '<div><button type="button" data-kind="image">Generate Image</button> <button type="button" data-kind="video">Generate Video</button></div>';
                media.querySelector('[data-kind=image]').onclick = generateImage;
                media.querySelector('[data-kind=video]').onclick = generateVideo;
            }

            function showError(title, message) {
                media.innerHTML = `<p class="error">${title}</p><p>${escapeHtml(message)}</p>`;
                const retry = document.createElement('button');
                retry.type = 'button'; retry.textContent = 'Back';
                retry.onclick = showButtons;
                media.appendChild(retry);
            }

            async function generateImage() {
                clearVideo();
                media.innerHTML = '<p>Generating Image...</p>';
                try {
                    const response = await fetch('/api/scenes/image', {
                        method: 'POST', headers: { 'Content-Type': 'application/json' }, body: JSON.stringify(payload)
                    });
                    if (!response.ok) throw new Error(await readError(response));
                    const { image_url } = await response.json();
                    media.innerHTML = `<img src="${image_url}" alt="Generated image for scene ${escapeHtml(scene.scene_id)}">`;
                } catch (err) {
                    showError('Image Failed', err.message);
                }
            }

            async function generateVideo() {
                clearVideo();
                media.innerHTML = '<p>Sending request to the video model...</p>';
                try {
                    const response = await fetch('/api/scenes/video', {
                        method: 'POST', headers: { 'Content-Type': 'application/json' }, body: JSON.stringify(payload)
                    });
                    if (!response.ok) throw new Error(await readError(response));
                    const { job_id, status_url } = await response.json();

                    media.innerHTML = '<p class="status">Generating video... This can take a few minutes. Please wait.</p>';
                    const cancel = document.createElement('button');
                    cancel.type = 'button'; cancel.textContent = 'Cancel';
                    cancel.onclick = () => fetch(`/api/jobs/${job_id}/cancel`, { method: 'POST' });
                    media.appendChild(cancel);

                    while (true) {
                        await new Promise(resolve => setTimeout(resolve, 3000));
                        const job = await (await fetch(status_url)).json();
                        if (job.status === 'running') media.querySelector('.status').textContent = job.current_step;
                        if (job.status === 'completed') {
                            videoUrl = job.media_url;
                            liveVideos.add(videoUrl);
                            media.innerHTML = `<video src="${job.media_url}" controls autoplay loop></video>`;
                            return;
                        }
                        if (job.status === 'failed') throw new Error(job.error);
                        if (job.status === 'cancelled') { showButtons(); return; }
                    }
                } catch (err) {
                    showError('Video Failed', err.message || 'An unknown error occurred during video generation.');
                }
            }

            showButtons();
            return el;
        }
    </script>
</body>
</html>
"###;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_page_lists_every_channel() {
        let Html(page) = campaign_page().await;
        for channel in CHANNEL_OPTIONS {
            assert!(page.contains(&format!(r#"value="{}""#, channel)));
        }
        assert!(!page.contains("{{CHANNELS}}"));
    }
}
