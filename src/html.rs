use crate::config::MapConfig;
use crate::popup::escape;
use crate::session::Snapshot;
use serde::Serialize;
use serde_json::json;

pub enum PageMode<'a> {
    Live,
    Snapshot(&'a Snapshot),
}

const PAGE: &str = r##"<!DOCTYPE html>
<html lang="pt-BR">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>__TITLE__</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>
  body { margin: 0; font-family: Arial, sans-serif; display: flex; min-height: 100vh; }
  #sidebar { width: 320px; padding: 16px; background: #f0f2f6; overflow-y: auto; box-sizing: border-box; }
  #main { flex: 1; padding: 16px 24px; }
  #map { width: 100%; height: __HEIGHT__px; }
  .banner { padding: 8px; border-radius: 4px; margin-bottom: 8px; }
  .success { background: #d4edda; }
  .warning { background: #fff3cd; }
  .info { background: #d1ecf1; }
  .category h3 { font-size: 15px; margin: 16px 0 6px; }
  .category label { display: block; font-size: 13px; margin: 2px 0; }
  footer { text-align: center; color: #666666; padding: 10px; border-top: 1px solid #ddd; margin-top: 16px; }
</style>
</head>
<body>
<aside id="sidebar">
  <div id="preselection"></div>
  <h2>🌿 Seleção por Bioma</h2>
  <div id="categories"></div>
</aside>
<main id="main">
  <h1>🗺️ __TITLE__</h1>
  <p>Selecione as comunidades quilombolas para visualizar no mapa</p>
  <div id="summary"></div>
  <div id="map"></div>
  <footer>📍 Aplicativo para visualização das Comunidades Quilombolas do Brasil</footer>
</main>
<script>
const CONFIG = __CONFIG__;
const SNAPSHOT = __SNAPSHOT__;
const readOnly = SNAPSHOT !== null;

const map = L.map('map').setView(CONFIG.center, CONFIG.zoom);
L.tileLayer(CONFIG.tileUrl, { attribution: CONFIG.attribution }).addTo(map);
let markers = null;

function el(tag, text, cls) {
  const node = document.createElement(tag);
  if (text !== undefined) node.textContent = text;
  if (cls) node.className = cls;
  return node;
}

async function call(method, path, body) {
  const response = await fetch(path, {
    method,
    headers: { 'Content-Type': 'application/json' },
    body: body === undefined ? undefined : JSON.stringify(body),
  });
  if (!response.ok) throw new Error(await response.text());
  draw(await response.json());
}

function drawPreselection(state) {
  const box = document.getElementById('preselection');
  box.replaceChildren();
  const pre = state.preselection;
  if (pre.warning) box.append(el('div', '⚠️ ' + pre.warning, 'banner warning'));
  if (pre.loaded > 0 && pre.active) {
    box.append(el('div', `✅ ${pre.loaded} comunidades pré-selecionadas carregadas!`, 'banner success'));
    const clear = el('button', '🔄 Limpar pré-seleção');
    clear.disabled = readOnly;
    clear.onclick = () => call('POST', '/api/clear');
    box.append(clear);
  }
}

function drawCategories(state) {
  const box = document.getElementById('categories');
  box.replaceChildren();
  for (const category of state.categories) {
    const group = el('div', undefined, 'category');
    group.append(el('h3', `${category.badge} ${category.name} (${category.count} comunidades)`));
    const chosen = new Set(category.selected);
    for (const name of category.options) {
      const label = el('label');
      const box = el('input');
      box.type = 'checkbox';
      box.value = name;
      box.checked = chosen.has(name);
      box.disabled = readOnly;
      box.onchange = () => {
        const names = [...group.querySelectorAll('input:checked')].map((i) => i.value);
        call('POST', '/api/selection', { category: category.name, names });
      };
      label.append(box, ' ' + name);
      group.append(label);
    }
    box.append(group);
  }
}

function drawSummary(state) {
  const box = document.getElementById('summary');
  box.replaceChildren();
  if (state.selected_count > 0) {
    box.append(el('h2', `📍 ${state.selected_count} comunidades selecionadas`));
  } else {
    box.append(el('div', '⚠️ Nenhuma comunidade selecionada. Use a barra lateral para escolher as comunidades por bioma.', 'banner info'));
  }
  if (state.excluded_rows > 0) {
    box.append(el('div', `${state.excluded_rows} linhas ignoradas por coordenadas inválidas ou dados incompletos.`, 'banner warning'));
  }
}

function drawMap(state) {
  if (markers) markers.remove();
  markers = L.geoJSON(state.layer, {
    pointToLayer: (feature, latlng) => L.circleMarker(latlng, feature.properties.style),
    onEachFeature: (feature, layer) => {
      layer.bindTooltip(feature.properties.tooltip);
      layer.bindPopup(feature.properties.popup, { maxWidth: feature.properties.popupMaxWidth });
    },
  }).addTo(map);

  const view = state.map;
  if (view.state === 'populated') {
    map.fitBounds([view.bounds.south_west, view.bounds.north_east], { padding: [30, 30], maxZoom: 10 });
  } else {
    map.setView(view.viewport.center, view.viewport.zoom);
  }
}

function draw(state) {
  drawPreselection(state);
  drawCategories(state);
  drawSummary(state);
  drawMap(state);
}

if (readOnly) {
  draw(SNAPSHOT);
} else {
  call('GET', '/api/state').catch((e) => alert(e.message));
}
</script>
</body>
</html>
"##;

// `<` can only appear inside JSON strings, where `\u003c` decodes the same
fn script_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    Ok(serde_json::to_string(value)?.replace('<', "\\u003c"))
}

// Single pass: inserted values are never scanned for placeholders
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some((at, key, value)) = values
        .iter()
        .filter_map(|(key, value)| rest.find(*key).map(|at| (at, *key, *value)))
        .min_by_key(|(at, _, _)| *at)
    {
        out.push_str(&rest[..at]);
        out.push_str(value);
        rest = &rest[at + key.len()..];
    }
    out.push_str(rest);
    out
}

pub fn render_page(config: &MapConfig, mode: PageMode<'_>) -> serde_json::Result<String> {
    let page_config = json!({
        "center": config.center,
        "zoom": config.zoom,
        "tileUrl": config.tile_url,
        "attribution": config.attribution,
    });
    let snapshot = match mode {
        PageMode::Live => "null".to_string(),
        PageMode::Snapshot(snapshot) => script_json(snapshot)?,
    };
    let title = escape(&config.title);
    let height = config.height.to_string();
    let page_config = script_json(&page_config)?;

    Ok(fill(
        PAGE,
        &[
            ("__TITLE__", title.as_str()),
            ("__HEIGHT__", height.as_str()),
            ("__CONFIG__", page_config.as_str()),
            ("__SNAPSHOT__", snapshot.as_str()),
        ],
    ))
}
