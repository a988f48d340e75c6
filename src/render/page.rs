//! Page shell
//!
//! Static markup plus a small script. Listeners are attached once to the
//! stable containers; every region is redrawn from the fragments the server
//! returns. Shared snippets travel in `<template>` elements so the script
//! never embeds markup in string literals.

pub const PAGE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en" dir="ltr">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Product Routine Builder</title>
  <style>
    body { font-family: system-ui, sans-serif; margin: 0 auto; max-width: 1100px; padding: 24px; }
    .products-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(220px, 1fr)); gap: 16px; }
    .product-card { position: relative; border: 2px solid #ddd; border-radius: 8px; padding: 12px; cursor: pointer; }
    .product-card.selected { border-color: #ff003b; }
    .product-card img { max-width: 100%; height: 120px; object-fit: contain; }
    .product-desc-overlay { position: absolute; inset: 0; background: rgba(0,0,0,.85); color: #fff; padding: 16px; border-radius: 6px; }
    .selected-product-item { display: flex; justify-content: space-between; padding: 4px 0; }
    .chat-window { min-height: 160px; border: 1px solid #ddd; border-radius: 8px; padding: 12px; }
    .chat-message { max-width: 80%; padding: 8px 12px; border-radius: 12px; margin: 6px 0; }
    .chat-message.user { margin-left: auto; background: #ff003b; color: #fff; }
    .chat-message.assistant { margin-right: auto; background: #f1f1f1; }
    .placeholder-message { color: #777; padding: 24px; text-align: center; }
    .status { color: #b00020; min-height: 1.2em; }
  </style>
</head>
<body>
  <h1>Smart Routine &amp; Product Advisor</h1>

  <select id="categoryFilter">
    <option value="" selected>Choose a Category</option>
    <option value="cleanser">Cleansers</option>
    <option value="moisturizer">Moisturizers &amp; Treatments</option>
    <option value="haircare">Haircare</option>
    <option value="makeup">Makeup</option>
    <option value="hair color">Hair Color</option>
    <option value="hair styling">Hair Styling</option>
    <option value="men's grooming">Men's Grooming</option>
    <option value="suncare">Suncare</option>
    <option value="fragrance">Fragrance</option>
  </select>

  <div id="productsContainer" class="products-grid">
    {{{choose_category}}}
  </div>

  <section class="selected-products">
    <h2>Selected Products</h2>
    <div id="selectedProductsList"></div>
    <button id="generateRoutine">Generate Routine</button>
  </section>

  <section class="chatbox">
    <h2>Let's Build Your Routine</h2>
    <div id="chatWindow" class="chat-window"></div>
    <form id="chatForm">
      <input id="userInput" name="message" autocomplete="off" placeholder="Ask me about products or routines…">
      <button id="sendBtn" type="submit">Send</button>
    </form>
    <div id="status" class="status"></div>
  </section>

  <template id="typingIndicator">{{{typing_indicator}}}</template>
  <template id="generatingNotice">{{{generating}}}</template>
  <template id="connectionFailedNotice">{{{connection_failed}}}</template>

  <script>
    const $ = (id) => document.getElementById(id);
    const TYPING_INDICATOR = $("typingIndicator").innerHTML;
    const GENERATING = $("generatingNotice").innerHTML;
    const CONNECTION_FAILED = $("connectionFailedNotice").innerHTML;
    const chatWindow = $("chatWindow");

    function apply(fragments) {
      if (fragments.products !== undefined) $("productsContainer").innerHTML = fragments.products;
      if (fragments.selected !== undefined) $("selectedProductsList").innerHTML = fragments.selected;
      if (fragments.chat !== undefined) {
        chatWindow.innerHTML = fragments.chat;
        const last = chatWindow.lastElementChild;
        if (last) last.scrollIntoView({ behavior: "smooth", block: "start" });
      }
    }

    async function call(method, url, body) {
      const options = { method, headers: {} };
      if (body !== undefined) {
        options.headers["Content-Type"] = "application/json";
        options.body = JSON.stringify(body);
      }
      const response = await fetch(url, options);
      const data = await response.json().catch(() => ({}));
      if (!response.ok) throw new Error(data.error || response.statusText);
      return data;
    }

    function setStatus(text) { $("status").textContent = text || ""; }

    function setBusy(busy) {
      $("generateRoutine").disabled = busy;
      $("sendBtn").disabled = busy;
    }

    async function run(method, url, body) {
      try {
        setStatus("");
        apply(await call(method, url, body));
      } catch (error) {
        setStatus(error.message);
      }
    }

    $("categoryFilter").addEventListener("change", (event) => {
      run("GET", "/products?category=" + encodeURIComponent(event.target.value));
    });

    $("productsContainer").addEventListener("click", (event) => {
      const toggle = event.target.closest(".product-desc-toggle");
      const card = event.target.closest(".product-card");
      if (!card) return;
      if (toggle) {
        const overlay = card.querySelector(".product-desc-overlay");
        const open = overlay.hidden;
        overlay.hidden = !open;
        toggle.setAttribute("aria-expanded", String(open));
        toggle.textContent = open ? "Hide Description" : "Show Description";
        return;
      }
      if (event.target.closest(".product-desc-overlay")) return;
      run("POST", "/selection/" + encodeURIComponent(card.dataset.id) + "/toggle");
    });

    $("selectedProductsList").addEventListener("click", (event) => {
      if (event.target.closest("#clearSelectedProducts")) {
        run("DELETE", "/selection");
        return;
      }
      const remove = event.target.closest(".selected-product-remove");
      if (!remove) return;
      const item = remove.closest(".selected-product-item");
      run("DELETE", "/selection/" + encodeURIComponent(item.dataset.id));
    });

    $("generateRoutine").addEventListener("click", async () => {
      setBusy(true);
      chatWindow.innerHTML = GENERATING;
      const chatbox = document.querySelector(".chatbox");
      if (chatbox) chatbox.scrollIntoView({ behavior: "smooth", block: "center" });
      try {
        await run("POST", "/routine");
      } finally {
        setBusy(false);
      }
    });

    $("chatForm").addEventListener("submit", async (event) => {
      event.preventDefault();
      const input = $("userInput");
      const message = input.value.trim();
      if (!message) return;
      input.value = "";

      const bubble = document.createElement("div");
      bubble.className = "chat-message user";
      bubble.textContent = message;
      chatWindow.appendChild(bubble);

      const holder = document.createElement("div");
      holder.innerHTML = TYPING_INDICATOR;
      const typing = holder.firstElementChild;
      chatWindow.appendChild(typing);
      chatWindow.scrollTop = chatWindow.scrollHeight;

      setBusy(true);
      try {
        const fragments = await call("POST", "/chat", { message });
        typing.remove();
        apply(fragments);
      } catch (error) {
        typing.remove();
        bubble.remove();
        chatWindow.insertAdjacentHTML("beforeend", CONNECTION_FAILED);
        setStatus(error.message);
      } finally {
        setBusy(false);
      }
    });

    run("GET", "/selection");
  </script>
</body>
</html>
"##;
