use chrono::Utc;
use spiral::models::Draft;
use spiral::workspace::{ComparisonWorkspace, MAX_OPEN_DRAFTS};
use speculate2::speculate;
use uuid::Uuid;

fn draft(title: &str) -> Draft {
    Draft {
        id: Uuid::new_v4(),
        session_id: Uuid::nil(),
        title: title.to_string(),
        content: format!("{title} body"),
        strategy: "Default".to_string(),
        word_count: 2,
        version: 1,
        is_selected: false,
        created_at: Utc::now(),
    }
}

fn titles(ws: &ComparisonWorkspace) -> Vec<String> {
    ws.open_drafts().into_iter().map(|d| d.title.clone()).collect()
}

speculate! {
    before {
        let drafts: Vec<Draft> = ["A", "B", "C", "D", "E"].into_iter().map(draft).collect();
        let ids: Vec<Uuid> = drafts.iter().map(|d| d.id).collect();
        let mut ws = ComparisonWorkspace::new(drafts.clone());
    }

    describe "default open set" {
        it "opens the first three drafts" {
            assert_eq!(MAX_OPEN_DRAFTS, 3);
            assert_eq!(ws.open_ids(), ids[..3].to_vec());
            assert_eq!(titles(&ws), vec!["A", "B", "C"]);
        }

        it "opens everything when there are fewer than three" {
            ws.set_drafts(drafts[..2].to_vec());
            assert_eq!(ws.open_ids(), ids[..2].to_vec());
        }

        it "is empty without drafts" {
            let empty = ComparisonWorkspace::new(Vec::new());
            assert!(empty.open_ids().is_empty());
            assert!(empty.open_drafts().is_empty());
        }

        it "falls back when every manual selection disappears" {
            ws.set_drafts(drafts[3..].to_vec());
            ws.toggle(ids[3]);
            assert_eq!(ws.open_ids(), vec![ids[4]]);

            ws.set_drafts(drafts[..4].to_vec());
            assert_eq!(ws.open_ids(), ids[..3].to_vec());
        }

        it "keeps the surviving part of a manual selection" {
            // Open set becomes [B, C, E].
            ws.toggle(ids[0]);
            ws.toggle(ids[4]);
            assert_eq!(ws.open_ids(), vec![ids[1], ids[2], ids[4]]);

            let without_c: Vec<Draft> = drafts.iter().filter(|d| d.id != ids[2]).cloned().collect();
            ws.set_drafts(without_c);
            assert_eq!(ws.open_ids(), vec![ids[1], ids[4]]);
        }
    }

    describe "toggle" {
        it "closes an open draft" {
            ws.toggle(ids[1]);
            assert_eq!(ws.open_ids(), vec![ids[0], ids[2]]);
            assert!(!ws.is_open(ids[1]));
        }

        it "appends when there is room" {
            ws.toggle(ids[1]);
            ws.toggle(ids[3]);
            assert_eq!(ws.open_ids(), vec![ids[0], ids[2], ids[3]]);
        }

        it "evicts the earliest opened draft when full" {
            ws.toggle(ids[3]);
            assert_eq!(ws.open_ids(), vec![ids[1], ids[2], ids[3]]);

            ws.toggle(ids[4]);
            assert_eq!(ws.open_ids(), vec![ids[2], ids[3], ids[4]]);
        }

        it "never opens more than three" {
            for id in &ids {
                ws.toggle(*id);
                assert!(ws.open_ids().len() <= MAX_OPEN_DRAFTS);
            }
        }

        it "reports open drafts in list order, not selection order" {
            ws.toggle(ids[0]);
            ws.toggle(ids[4]);
            ws.toggle(ids[0]);
            // B was evicted to make room for A.
            assert_eq!(ws.open_ids(), vec![ids[2], ids[4], ids[0]]);
            assert_eq!(titles(&ws), vec!["A", "C", "E"]);
        }

        it "reverts to the default after closing the last open draft" {
            ws.set_drafts(drafts[..1].to_vec());
            ws.toggle(ids[0]);
            assert_eq!(ws.open_ids(), vec![ids[0]]);
        }

        it "ignores unknown ids" {
            ws.toggle(Uuid::new_v4());
            assert_eq!(ws.open_ids(), ids[..3].to_vec());
        }
    }

    describe "close" {
        it "removes an open draft" {
            ws.close(ids[0]);
            assert_eq!(ws.open_ids(), vec![ids[1], ids[2]]);
        }

        it "does nothing for a closed draft" {
            ws.close(ids[4]);
            assert_eq!(ws.open_ids(), ids[..3].to_vec());
        }

        it "ignores unknown ids" {
            ws.close(Uuid::new_v4());
            assert_eq!(ws.open_ids(), ids[..3].to_vec());
        }
    }

    describe "hide" {
        it "removes the draft from the visible list" {
            ws.hide(ids[1]);

            assert!(ws.is_hidden(ids[1]));
            let visible: Vec<Uuid> = ws.visible_drafts().iter().map(|d| d.id).collect();
            assert_eq!(visible, vec![ids[0], ids[2], ids[3], ids[4]]);
        }

        it "shifts the default open set past hidden drafts" {
            ws.hide(ids[0]);
            assert_eq!(ws.open_ids(), vec![ids[1], ids[2], ids[3]]);
        }

        it "drops a hidden draft from a manual selection" {
            ws.toggle(ids[3]);
            ws.hide(ids[2]);
            assert_eq!(ws.open_ids(), vec![ids[1], ids[3]]);
        }

        it "survives a refreshed draft list" {
            ws.hide(ids[0]);
            ws.set_drafts(drafts.clone());
            assert!(!ws.open_ids().contains(&ids[0]));
        }

        it "cannot be toggled open" {
            ws.hide(ids[4]);
            ws.toggle(ids[4]);
            assert!(!ws.is_open(ids[4]));
        }

        it "ignores unknown ids" {
            let unknown = Uuid::new_v4();
            ws.hide(unknown);
            assert!(!ws.is_hidden(unknown));
        }
    }
}
