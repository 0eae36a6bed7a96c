//! Scenario tests for the binder engine over a parsed page.
//!
//! Every test drives the page the way an operator would: mutate a control, hand
//! the fired listeners to the binder, then read the target nodes back.

#[cfg(test)]
mod tests {
    use crate::binder::Binder;
    use crate::config::BinderConfig;
    use crate::document::{Document, NodeRef};
    use crate::dom::{Dom, EventKind};
    use crate::error::BinderError;
    use crate::writer::GroupState;

    fn one(doc: &Document, selector: &str) -> NodeRef {
        doc.query_one(selector).unwrap().unwrap()
    }

    fn html_of(doc: &Document, selector: &str) -> Vec<String> {
        doc.query(selector)
            .unwrap()
            .iter()
            .map(|n| doc.inner_html(n))
            .collect()
    }

    fn bound(html: &str) -> (Document, Binder<Document>) {
        bound_with(html, BinderConfig::default())
    }

    fn bound_with(html: &str, config: BinderConfig) -> (Document, Binder<Document>) {
        let mut doc = Document::parse(html).unwrap();
        let mut binder = Binder::new(config).unwrap();
        binder.init(&mut doc, None);
        (doc, binder)
    }

    fn check(doc: &mut Document, binder: &mut Binder<Document>, selector: &str, on: bool) {
        let node = one(doc, selector);
        let fired = doc.set_checked(&node, on);
        binder.handle_events(doc, &fired);
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // OPERATOR SCENARIOS
    // ═══════════════════════════════════════════════════════════════════════════════

    const DELAY_PAGE: &str = r#"<!DOCTYPE html>
<html><body>
  <input id="a" type="checkbox" data-bind-target=".delay-notice" data-priority="1" data-value="通常より">
  <input id="b" type="checkbox" data-bind-target=".delay-notice" data-priority="2" data-value="年末年始">
  <p class="delay-notice">配送は<b>通常通り</b>です</p>
  <p class="delay-notice">配送は<b>通常通り</b>です</p>
</body></html>"#;

    const DELAY_ORIGINAL: &str = "配送は<b>通常通り</b>です";

    #[test]
    fn test_delay_notice_priority_and_restore() {
        let (mut doc, mut binder) = bound(DELAY_PAGE);
        assert_eq!(html_of(&doc, ".delay-notice"), vec![DELAY_ORIGINAL; 2]);

        check(&mut doc, &mut binder, "#b", true);
        assert_eq!(html_of(&doc, ".delay-notice"), vec!["年末年始"; 2]);

        check(&mut doc, &mut binder, "#a", true);
        assert_eq!(html_of(&doc, ".delay-notice"), vec!["通常より"; 2]);

        check(&mut doc, &mut binder, "#a", false);
        assert_eq!(html_of(&doc, ".delay-notice"), vec!["年末年始"; 2]);

        check(&mut doc, &mut binder, "#b", false);
        assert_eq!(html_of(&doc, ".delay-notice"), vec![DELAY_ORIGINAL; 2]);
        assert_eq!(binder.group_state(".delay-notice"), GroupState::Original);
    }

    #[test]
    fn test_restore_is_exact_after_many_cycles() {
        let (mut doc, mut binder) = bound(DELAY_PAGE);
        for _ in 0..5 {
            check(&mut doc, &mut binder, "#a", true);
            check(&mut doc, &mut binder, "#b", true);
            check(&mut doc, &mut binder, "#a", false);
            check(&mut doc, &mut binder, "#b", false);
        }
        assert_eq!(html_of(&doc, ".delay-notice"), vec![DELAY_ORIGINAL; 2]);
        assert_eq!(binder.original(".delay-notice"), Some(DELAY_ORIGINAL));
    }

    #[test]
    fn test_empty_select_keeps_original() {
        let (mut doc, mut binder) = bound(
            r#"<body>
            <select id="s" data-bind-target=".bui-text">
              <option value="">選択してください</option>
              <option value="雨天のため">雨天</option>
            </select>
            <span class="bui-text">元の文</span>
            </body>"#,
        );
        assert_eq!(html_of(&doc, ".bui-text"), vec!["元の文"]);

        let select = one(&doc, "#s");
        let fired = doc.select_option(&select, "雨天のため");
        assert_eq!(binder.handle_events(&mut doc, &fired), 1);
        assert_eq!(html_of(&doc, ".bui-text"), vec!["雨天のため"]);

        let fired = doc.select_option(&select, "");
        binder.handle_events(&mut doc, &fired);
        assert_eq!(html_of(&doc, ".bui-text"), vec!["元の文"]);
    }

    #[test]
    fn test_one_source_fans_out_to_every_group() {
        let (mut doc, mut binder) = bound(
            r#"<body>
            <input id="m" type="checkbox" data-bind-target=".x; .y" data-value="両方">
            <p class="x">x</p><p class="y">y</p><p class="y">y</p>
            </body>"#,
        );
        let node = one(&doc, "#m");
        let fired = doc.set_checked(&node, true);
        assert_eq!(binder.handle_events(&mut doc, &fired), 1);
        assert_eq!(html_of(&doc, ".x"), vec!["両方"]);
        assert_eq!(html_of(&doc, ".y"), vec!["両方", "両方"]);
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let (mut doc, mut binder) = bound(DELAY_PAGE);
        check(&mut doc, &mut binder, "#b", true);
        let before = doc.to_html();
        binder.refresh(&mut doc, ".delay-notice");
        binder.refresh(&mut doc, ".delay-notice");
        assert_eq!(doc.to_html(), before);
    }

    #[test]
    fn test_equal_priority_goes_to_first_registered() {
        let (doc, binder) = bound(
            r#"<body>
            <button data-bind-target=".t" data-value="first">1</button>
            <button data-bind-target=".t" data-value="second">2</button>
            <p class="t">-</p>
            </body>"#,
        );
        assert_eq!(html_of(&doc, ".t"), vec!["first"]);
        assert_eq!(binder.group_state(".t"), GroupState::Active("first".to_string()));
    }

    #[test]
    fn test_button_value_attribute_is_static_source() {
        let (doc, binder) = bound(
            r#"<body>
            <button value="固定文" data-bind-target=".t">送る</button>
            <p class="t">orig</p>
            </body>"#,
        );
        assert_eq!(binder.sources().len(), 1);
        assert_eq!(html_of(&doc, ".t"), vec!["固定文"]);
    }

    #[test]
    fn test_priority_beats_document_order() {
        let (doc, _binder) = bound(
            r#"<body>
            <button data-bind-target=".t" data-value="default">1</button>
            <button data-bind-target=".t" data-value="ranked" data-priority="5">2</button>
            <p class="t">-</p>
            </body>"#,
        );
        assert_eq!(html_of(&doc, ".t"), vec!["ranked"]);
    }

    #[test]
    fn test_explicit_empty_inactive_value_is_written() {
        let (mut doc, mut binder) = bound(
            r#"<body>
            <input id="c" type="checkbox" data-bind-target=".opt" data-value="あり" data-inactive-value="">
            <span class="opt">既定</span>
            </body>"#,
        );
        assert_eq!(html_of(&doc, ".opt"), vec![""]);
        assert_eq!(binder.original(".opt"), Some("既定"));

        check(&mut doc, &mut binder, "#c", true);
        assert_eq!(html_of(&doc, ".opt"), vec!["あり"]);
        check(&mut doc, &mut binder, "#c", false);
        assert_eq!(html_of(&doc, ".opt"), vec![""]);
    }

    #[test]
    fn test_unchecking_radio_peer_restores_its_group() {
        let (mut doc, mut binder) = bound(
            r#"<body>
            <input id="r1" type="radio" name="plan" value="早朝" data-bind-target=".slot-a">
            <input id="r2" type="radio" name="plan" value="夜間" data-bind-target=".slot-b">
            <p class="slot-a">A</p><p class="slot-b">B</p>
            </body>"#,
        );
        check(&mut doc, &mut binder, "#r1", true);
        assert_eq!(html_of(&doc, ".slot-a"), vec!["早朝"]);

        check(&mut doc, &mut binder, "#r2", true);
        assert_eq!(html_of(&doc, ".slot-a"), vec!["A"]);
        assert_eq!(html_of(&doc, ".slot-b"), vec!["夜間"]);
    }

    #[test]
    fn test_text_input_updates_live_on_input() {
        let page = r#"<body><input id="n" data-bind-target=".name"><span class="name">お客様</span></body>"#;
        let (mut doc, mut binder) = bound(page);
        let node = one(&doc, "#n");
        doc.set_attribute(&node, "value", "山田");
        let fired = doc.dispatch(&node, EventKind::Input);
        assert_eq!(binder.handle_events(&mut doc, &fired), 1);
        assert_eq!(html_of(&doc, ".name"), vec!["山田"]);

        let config = BinderConfig {
            live_text: false,
            ..BinderConfig::default()
        };
        let (mut doc, mut binder) = bound_with(page, config);
        let node = one(&doc, "#n");
        doc.set_attribute(&node, "value", "山田");
        assert!(doc.dispatch(&node, EventKind::Input).is_empty());
        let fired = doc.dispatch(&node, EventKind::Change);
        binder.handle_events(&mut doc, &fired);
        assert_eq!(html_of(&doc, ".name"), vec!["山田"]);
    }

    #[test]
    fn test_text_toggler_preset() {
        let (mut doc, mut binder) = bound_with(
            r#"<body>
            <input id="t" type="checkbox" data-toggle-target=".msg" data-toggle-text="折り返し希望" data-toggle-off-text="不要">
            <p class="msg">-</p>
            </body>"#,
            BinderConfig::text_toggler(),
        );
        assert_eq!(html_of(&doc, ".msg"), vec!["不要"]);
        check(&mut doc, &mut binder, "#t", true);
        assert_eq!(html_of(&doc, ".msg"), vec!["折り返し希望"]);
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // FAILURE MODES
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_bad_and_missing_groups_do_not_stop_others() {
        let (mut doc, mut binder) = bound(
            r#"<body>
            <input id="bad" type="checkbox" data-bind-target="p[" data-value="x">
            <input id="gone" type="checkbox" data-bind-target=".nowhere" data-value="x">
            <input id="ok" type="checkbox" data-bind-target=".ok" data-value="届く">
            <input id="none" type="checkbox">
            <p class="ok">-</p>
            </body>"#,
        );
        assert_eq!(binder.sources().len(), 3);
        check(&mut doc, &mut binder, "#bad", true);
        check(&mut doc, &mut binder, "#gone", true);
        check(&mut doc, &mut binder, "#ok", true);
        assert_eq!(html_of(&doc, ".ok"), vec!["届く"]);
        assert_eq!(binder.group_state("p["), GroupState::Unresolved);
        assert_eq!(binder.group_state(".nowhere"), GroupState::Unresolved);
        assert_eq!(binder.original(".nowhere"), None);
    }

    #[test]
    fn test_construction_and_root_errors() {
        let bad = BinderConfig {
            source_selectors: Vec::new(),
            ..BinderConfig::default()
        };
        assert!(matches!(
            Binder::<Document>::new(bad),
            Err(BinderError::Config { .. })
        ));

        let mut doc = Document::parse(DELAY_PAGE).unwrap();
        let mut binder = Binder::new(BinderConfig::default()).unwrap();
        assert!(matches!(
            binder.init_within(&mut doc, "#absent"),
            Err(BinderError::MissingRoot { .. })
        ));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_init_within_limits_discovery() {
        let mut doc = Document::parse(
            r#"<body>
            <div id="panel"><button data-bind-target=".in" data-value="内">b</button></div>
            <button data-bind-target=".out" data-value="外">b</button>
            <p class="in">-</p><p class="out">-</p>
            </body>"#,
        )
        .unwrap();
        let mut binder = Binder::new(BinderConfig::default()).unwrap();
        assert_eq!(binder.init_within(&mut doc, "#panel").unwrap(), 1);
        assert_eq!(html_of(&doc, ".in"), vec!["内"]);
        assert_eq!(html_of(&doc, ".out"), vec!["-"]);
    }

    #[test]
    fn test_overlapping_source_selectors_register_once() {
        let config = BinderConfig {
            source_selectors: vec!["[data-bind-target]".to_string(), "input".to_string()],
            ..BinderConfig::default()
        };
        let (mut doc, mut binder) = bound_with(
            r#"<body>
            <input id="c" type="checkbox" data-bind-target=".g" data-value="on">
            <p class="g">off</p>
            </body>"#,
            config,
        );
        assert_eq!(binder.sources().len(), 1);
        assert_eq!(binder.listener_count(), 1);
        assert_eq!(doc.listener_count(), 1);

        check(&mut doc, &mut binder, "#c", true);
        assert_eq!(html_of(&doc, ".g"), vec!["on"]);
    }

    #[test]
    fn test_reinit_keeps_snapshot_and_listener_count() {
        let (mut doc, mut binder) = bound(DELAY_PAGE);
        check(&mut doc, &mut binder, "#b", true);
        assert_eq!(doc.listener_count(), 2);

        assert_eq!(binder.init(&mut doc, None), 2);
        assert_eq!(doc.listener_count(), 2);
        assert_eq!(binder.original(".delay-notice"), Some(DELAY_ORIGINAL));

        check(&mut doc, &mut binder, "#b", false);
        assert_eq!(html_of(&doc, ".delay-notice"), vec![DELAY_ORIGINAL; 2]);
    }

    #[test]
    fn test_remove_and_add_element() {
        let (mut doc, mut binder) = bound(
            r#"<body>
            <input id="a" type="checkbox" data-bind-target=".g" data-priority="1" data-value="A" checked>
            <input id="b" type="checkbox" data-bind-target=".g" data-priority="2" data-value="B" checked>
            <p class="g">-</p>
            </body>"#,
        );
        assert_eq!(html_of(&doc, ".g"), vec!["A"]);

        let a = one(&doc, "#a");
        assert!(binder.remove_element(&mut doc, &a));
        assert!(!binder.remove_element(&mut doc, &a));
        assert_eq!(html_of(&doc, ".g"), vec!["B"]);
        assert_eq!(doc.listener_count(), 1);
        assert!(doc.set_checked(&a, false).is_empty());

        assert!(binder.add_element(&mut doc, &a));
        assert!(!binder.add_element(&mut doc, &a));
        assert_eq!(html_of(&doc, ".g"), vec!["B"]);

        check(&mut doc, &mut binder, "#a", true);
        assert_eq!(html_of(&doc, ".g"), vec!["A"]);
    }

    #[test]
    fn test_manual_update_holds_until_group_resolves() {
        let (mut doc, mut binder) = bound(
            r#"<body>
            <input id="g" type="checkbox" data-bind-target=".g" data-value="G">
            <input id="h" type="checkbox" data-bind-target=".h" data-value="H">
            <p class="g">g</p><p class="h">h</p>
            </body>"#,
        );
        binder.update_targets(&mut doc, ".g", "<em>手動</em>");
        assert_eq!(html_of(&doc, ".g"), vec!["<em>手動</em>"]);
        assert_eq!(
            binder.group_state(".g"),
            GroupState::Active("<em>手動</em>".to_string())
        );

        check(&mut doc, &mut binder, "#h", true);
        assert_eq!(html_of(&doc, ".g"), vec!["<em>手動</em>"]);

        check(&mut doc, &mut binder, "#g", true);
        assert_eq!(html_of(&doc, ".g"), vec!["G"]);
        check(&mut doc, &mut binder, "#g", false);
        assert_eq!(html_of(&doc, ".g"), vec!["g"]);
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let (mut doc, mut binder) = bound(DELAY_PAGE);
        check(&mut doc, &mut binder, "#a", true);

        binder.cleanup(&mut doc);
        binder.cleanup(&mut doc);
        assert!(binder.sources().is_empty());
        assert!(binder.groups().is_empty());
        assert_eq!(binder.listener_count(), 0);
        assert_eq!(doc.listener_count(), 0);
        assert_eq!(binder.original(".delay-notice"), None);

        // the page keeps whatever was last written
        let a = one(&doc, "#a");
        assert!(doc.set_checked(&a, false).is_empty());
        assert_eq!(html_of(&doc, ".delay-notice"), vec!["通常より"; 2]);

        binder.destroy(&mut doc);
    }

    #[test]
    fn test_instances_coexist_without_cross_talk() {
        let mut doc = Document::parse(
            r#"<body>
            <input id="x" type="checkbox"
                   data-bind-target=".bind-out" data-value="B"
                   data-toggle-target=".toggle-out" data-toggle-text="T">
            <p class="bind-out">b</p><p class="toggle-out">t</p>
            </body>"#,
        )
        .unwrap();
        let mut form = Binder::new(BinderConfig::form_binder()).unwrap();
        let mut toggle = Binder::new(BinderConfig::text_toggler()).unwrap();
        form.init(&mut doc, None);
        toggle.init(&mut doc, None);

        let x = one(&doc, "#x");
        let fired = doc.set_checked(&x, true);
        assert_eq!(fired.len(), 2);
        assert_eq!(form.handle_events(&mut doc, &fired), 1);
        assert_eq!(toggle.handle_events(&mut doc, &fired), 1);
        assert_eq!(html_of(&doc, ".bind-out"), vec!["B"]);
        assert_eq!(html_of(&doc, ".toggle-out"), vec!["T"]);
        assert_eq!(form.group_state(".toggle-out"), GroupState::Unresolved);

        form.cleanup(&mut doc);
        let fired = doc.set_checked(&x, false);
        assert_eq!(fired.len(), 1);
        assert_eq!(form.handle_events(&mut doc, &fired), 0);
        assert_eq!(toggle.handle_events(&mut doc, &fired), 1);
        assert_eq!(html_of(&doc, ".bind-out"), vec!["B"]);
        assert_eq!(html_of(&doc, ".toggle-out"), vec!["t"]);
    }
}
