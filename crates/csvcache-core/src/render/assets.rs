//! Inline style and scripts shipped with every widget.
//!
//! Each script initialises every widget of its kind not yet marked
//! `data-ready`, so a page with several widgets runs the work once per widget.

pub const WIDGET_STYLE: &str = r#"
.csvcache{font:14px/1.4 system-ui,sans-serif;margin:1em 0}
.csvcache-controls,.csvcache-pager{display:flex;gap:1em;align-items:center;margin:.5em 0}
.csvcache-scroll{overflow-x:auto}
.csvcache table{border-collapse:collapse;width:100%}
.csvcache th,.csvcache td{border:1px solid #ddd;padding:4px 8px;text-align:left}
.csvcache th{cursor:pointer;background:#f5f5f5;user-select:none}
.csvcache th[aria-sort=ascending]::after{content:" \25B2"}
.csvcache th[aria-sort=descending]::after{content:" \25BC"}
.csvcache-tabs{display:flex;flex-wrap:wrap;gap:4px;margin-bottom:.5em}
.csvcache-tabs button{border:1px solid #ccc;background:#fafafa;padding:4px 10px;cursor:pointer}
.csvcache-tabs button.active{background:#333;color:#fff}
.csvcache-latest{margin:.5em 0}
.csvcache-value{font-size:1.6em;font-weight:600}
.csvcache canvas{max-width:100%}
"#;

pub const TABLE_SCRIPT: &str = r#"
(function () {
  var DECIMAL = /^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$/;
  function num(text) {
    var t = text.trim();
    if (!DECIMAL.test(t)) return null;
    var n = Number(t);
    return isFinite(n) ? n : null;
  }
  function compare(a, b) {
    var x = num(a), y = num(b);
    if (x !== null && y !== null) return x - y;
    return a < b ? -1 : a > b ? 1 : 0;
  }
  function init(root) {
    root.setAttribute("data-ready", "1");
    var tbody = root.querySelector("tbody");
    var original = Array.prototype.slice.call(tbody.rows);
    var rows = original.slice();
    var headers = root.querySelectorAll("th[data-col]");
    var select = root.querySelector(".csvcache-page-size");
    var info = root.querySelector(".csvcache-page-info");
    var state = { col: null, dir: 0, page: 0, size: parseInt(select.value, 10) || 15 };

    function pageCount() {
      return Math.max(1, Math.ceil(rows.length / state.size));
    }
    function show() {
      var start = state.page * state.size, end = start + state.size;
      rows.forEach(function (tr, i) {
        tr.style.display = i >= start && i < end ? "" : "none";
      });
      info.textContent = "Page " + (state.page + 1) + " of " + pageCount();
    }
    function sortBy(col) {
      if (state.col === col) {
        state.dir = state.dir === 1 ? -1 : 1;
      } else {
        state.col = col;
        state.dir = 1;
      }
      var keyed = original.map(function (tr, i) { return [tr, i]; });
      keyed.sort(function (a, b) {
        var c = state.dir * compare(a[0].cells[col].textContent, b[0].cells[col].textContent);
        return c !== 0 ? c : a[1] - b[1];
      });
      rows = keyed.map(function (p) { return p[0]; });
      rows.forEach(function (tr) { tbody.appendChild(tr); });
      Array.prototype.forEach.call(headers, function (th) {
        var mine = parseInt(th.getAttribute("data-col"), 10) === col;
        th.setAttribute("aria-sort", mine ? (state.dir === 1 ? "ascending" : "descending") : "none");
      });
      state.page = 0;
      show();
    }

    Array.prototype.forEach.call(headers, function (th) {
      var col = parseInt(th.getAttribute("data-col"), 10);
      th.addEventListener("click", function () { sortBy(col); });
      th.addEventListener("keydown", function (e) {
        if (e.key === "Enter") sortBy(col);
      });
    });
    select.addEventListener("change", function () {
      state.size = parseInt(select.value, 10) || 15;
      state.page = 0;
      show();
    });
    root.querySelector(".csvcache-prev").addEventListener("click", function () {
      if (state.page > 0) { state.page--; show(); }
    });
    root.querySelector(".csvcache-next").addEventListener("click", function () {
      if (state.page < pageCount() - 1) { state.page++; show(); }
    });
    show();
  }
  var roots = document.querySelectorAll(".csvcache-table:not([data-ready])");
  Array.prototype.forEach.call(roots, init);
})();
"#;

pub const TIMELINE_SCRIPT: &str = r#"
(function () {
  function fallback(canvas, points) {
    var ctx = canvas.getContext && canvas.getContext("2d");
    if (!ctx || points.length === 0) return;
    var w = canvas.width, h = canvas.height, pad = 24;
    var values = points.map(function (p) { return p.value; });
    var min = Math.min.apply(null, values), max = Math.max.apply(null, values);
    var span = max - min || 1;
    ctx.clearRect(0, 0, w, h);
    ctx.strokeStyle = "rgb(51, 102, 204)";
    ctx.lineWidth = 2;
    ctx.beginPath();
    points.forEach(function (p, i) {
      var x = points.length === 1 ? w / 2 : pad + i * (w - 2 * pad) / (points.length - 1);
      var y = h - pad - (p.value - min) / span * (h - 2 * pad);
      if (i === 0) ctx.moveTo(x, y); else ctx.lineTo(x, y);
    });
    ctx.stroke();
  }
  function draw(canvas, series) {
    var points = series.history;
    if (window.Chart) {
      new window.Chart(canvas, {
        type: "line",
        data: {
          labels: points.map(function (p) { return p.date; }),
          datasets: [{ label: series.label + " (" + series.unit + ")", data: points.map(function (p) { return p.value; }) }]
        },
        options: { responsive: false, animation: false }
      });
    } else {
      fallback(canvas, points);
    }
  }
  function init(root) {
    root.setAttribute("data-ready", "1");
    var data;
    try {
      data = JSON.parse(root.querySelector("script.csvcache-series").textContent);
    } catch (e) {
      data = [];
    }
    var tabs = root.querySelectorAll("[role=tab]");
    var panels = root.querySelectorAll("[role=tabpanel]");
    var initialized = {};

    function activate(i) {
      if (i < 0 || i >= panels.length) return;
      Array.prototype.forEach.call(tabs, function (tab, j) {
        tab.setAttribute("aria-selected", j === i ? "true" : "false");
        tab.className = j === i ? "active" : "";
      });
      Array.prototype.forEach.call(panels, function (panel, j) {
        panel.hidden = j !== i;
      });
      if (!initialized[i] && data[i]) {
        initialized[i] = true;
        draw(panels[i].querySelector("canvas"), data[i]);
      }
    }

    Array.prototype.forEach.call(tabs, function (tab, i) {
      tab.addEventListener("click", function () { activate(i); });
    });
    activate(0);
  }
  var roots = document.querySelectorAll(".csvcache-timeline:not([data-ready])");
  Array.prototype.forEach.call(roots, init);
})();
"#;
