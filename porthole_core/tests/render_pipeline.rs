
    use std::string::ToString as _;
    use std::vec;
    use core::pin::pin;
    use core::task::{Context, Poll};

    use futures::executor::block_on;
    use futures::task::noop_waker;
    use porthole_harness::{
        CountingFrameSink, FakeDecoder, FakeRasterizer, FakeSurface, Gate, test_font,
    };

    use porthole_core::render::*;
    use core::cell::RefCell;
    use porthole_core::backend::{FrameSink as _, PixelSurface as _, Rasterizer as _, MarkupDecoder as _};
    use porthole_core::error::RenderError;
    use porthole_core::font::{FontCache, FontSpec};
    use porthole_core::trace::Tracer;

    use porthole_core::session::Generations;

    const MARKUP: &str = r#"<svg width="320" height="240" viewBox="0 0 320 240"></svg>"#;

    #[test]
    fn pipeline_paints_one_frame() {
        let rasterizer = FakeRasterizer::new(MARKUP);
        let decoder = FakeDecoder::new();
        let mut surface = FakeSurface::new(1, 1);
        let frames = CountingFrameSink::new();
        let cache = RefCell::new(FontCache::new());
        let fonts = FontSpec::pre_resolved(vec![test_font("Inter")]);
        let generations = Generations::new();
        let ticket = generations.begin();

        let prepared = block_on(prepare_frame(
            &rasterizer,
            &decoder,
            &"scene".to_string(),
            SurfaceGeometry::new(320.0, 240.0),
            &fonts,
            &cache,
            &ticket,
            &mut Tracer::none(),
        ))
        .unwrap()
        .unwrap();
        let outcome = commit_frame(
            &mut surface,
            prepared,
            &ticket,
            &frames,
            &mut Tracer::none(),
        )
        .unwrap();

        assert_eq!(outcome, RenderOutcome::Painted);
        let calls = rasterizer.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!((calls[0].width, calls[0].height), (320.0, 240.0));
        assert_eq!(calls[0].fonts, vec!["Inter".to_string()]);
        assert_eq!(surface.pixel_size(), (320, 240));
        assert_eq!(surface.painted(), vec![MARKUP.to_string()]);
        assert_eq!(frames.requests(), 1);
    }

    #[test]
    fn scale_widens_surface_and_markup_but_not_the_scene() {
        let rasterizer = FakeRasterizer::new(MARKUP);
        let decoder = FakeDecoder::new();
        let mut surface = FakeSurface::new(1, 1);
        let frames = CountingFrameSink::new();
        let cache = RefCell::new(FontCache::new());
        let fonts = FontSpec::pre_resolved(vec![]);
        let generations = Generations::new();
        let ticket = generations.begin();

        let prepared = block_on(prepare_frame(
            &rasterizer,
            &decoder,
            &"scene".to_string(),
            SurfaceGeometry::new(320.0, 240.0).with_scale(2.0),
            &fonts,
            &cache,
            &ticket,
            &mut Tracer::none(),
        ))
        .unwrap()
        .unwrap();
        commit_frame(
            &mut surface,
            prepared,
            &ticket,
            &frames,
            &mut Tracer::none(),
        )
        .unwrap();

        // The rasterizer still lays out at logical dimensions.
        let calls = rasterizer.calls();
        assert_eq!((calls[0].width, calls[0].height), (320.0, 240.0));
        // The surface and the markup's root attributes are doubled.
        assert_eq!(surface.pixel_size(), (640, 480));
        let painted = surface.painted();
        assert!(painted[0].contains(r#"width="640""#), "{}", painted[0]);
        assert!(painted[0].contains(r#"height="480""#), "{}", painted[0]);
        assert!(painted[0].contains(r#"viewBox="0 0 320 240""#), "{}", painted[0]);
    }

    #[test]
    fn rasterize_failure_leaves_the_surface_untouched() {
        let rasterizer = FakeRasterizer::failing("boom");
        let decoder = FakeDecoder::new();
        let surface = FakeSurface::new(320, 240);
        let cache = RefCell::new(FontCache::new());
        let fonts = FontSpec::pre_resolved(vec![]);
        let generations = Generations::new();
        let ticket = generations.begin();

        let result = block_on(prepare_frame(
            &rasterizer,
            &decoder,
            &"scene".to_string(),
            SurfaceGeometry::new(320.0, 240.0),
            &fonts,
            &cache,
            &ticket,
            &mut Tracer::none(),
        ));

        assert!(matches!(result, Err(RenderError::Rasterize(_))));
        assert_eq!(result.unwrap_err().stage(), "rasterize");
        assert!(surface.painted().is_empty());
    }

    #[test]
    fn decode_failure_releases_the_temporary_resource() {
        let rasterizer = FakeRasterizer::new(MARKUP);
        let decoder = FakeDecoder::failing("bad markup");
        let cache = RefCell::new(FontCache::new());
        let fonts = FontSpec::pre_resolved(vec![]);
        let generations = Generations::new();
        let ticket = generations.begin();

        let result = block_on(prepare_frame(
            &rasterizer,
            &decoder,
            &"scene".to_string(),
            SurfaceGeometry::new(320.0, 240.0),
            &fonts,
            &cache,
            &ticket,
            &mut Tracer::none(),
        ));

        assert!(matches!(result, Err(RenderError::Decode(_))));
        assert_eq!(decoder.outstanding_resources(), 0);
    }

    #[test]
    fn superseded_cycle_yields_nothing() {
        let gate = Gate::new();
        let rasterizer = FakeRasterizer::gated(MARKUP, gate.clone());
        let decoder = FakeDecoder::new();
        let cache = RefCell::new(FontCache::new());
        let fonts = FontSpec::pre_resolved(vec![]);
        let generations = Generations::new();
        let ticket = generations.begin();

        let scene = "scene".to_string();
        let mut tracer = Tracer::none();
        let mut fut = pin!(prepare_frame(
            &rasterizer,
            &decoder,
            &scene,
            SurfaceGeometry::new(320.0, 240.0),
            &fonts,
            &cache,
            &ticket,
            &mut tracer,
        ));
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        // Parked at the rasterizer await.
        assert!(fut.as_mut().poll(&mut cx).is_pending());
        // A newer cycle begins while the old one is in flight.
        let _newer = generations.begin();
        gate.open();
        let Poll::Ready(result) = fut.as_mut().poll(&mut cx) else {
            panic!("future still pending after the gate opened");
        };
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn commit_recheck_discards_a_stale_frame() {
        let rasterizer = FakeRasterizer::new(MARKUP);
        let decoder = FakeDecoder::new();
        let mut surface = FakeSurface::new(320, 240);
        let frames = CountingFrameSink::new();
        let cache = RefCell::new(FontCache::new());
        let fonts = FontSpec::pre_resolved(vec![]);
        let generations = Generations::new();
        let ticket = generations.begin();

        let prepared = block_on(prepare_frame(
            &rasterizer,
            &decoder,
            &"scene".to_string(),
            SurfaceGeometry::new(320.0, 240.0),
            &fonts,
            &cache,
            &ticket,
            &mut Tracer::none(),
        ))
        .unwrap()
        .unwrap();
        // The caller yielded between the halves and a newer cycle began.
        let _newer = generations.begin();
        let outcome = commit_frame(
            &mut surface,
            prepared,
            &ticket,
            &frames,
            &mut Tracer::none(),
        )
        .unwrap();

        assert_eq!(outcome, RenderOutcome::Superseded);
        assert!(surface.painted().is_empty());
        assert_eq!(frames.requests(), 0);
    }

    #[test]
    fn matching_dimensions_skip_the_resize() {
        let rasterizer = FakeRasterizer::new(MARKUP);
        let decoder = FakeDecoder::new();
        let mut surface = FakeSurface::new(320, 240);
        let frames = CountingFrameSink::new();
        let cache = RefCell::new(FontCache::new());
        let fonts = FontSpec::pre_resolved(vec![]);
        let generations = Generations::new();
        let ticket = generations.begin();

        let prepared = block_on(prepare_frame(
            &rasterizer,
            &decoder,
            &"scene".to_string(),
            SurfaceGeometry::new(320.0, 240.0),
            &fonts,
            &cache,
            &ticket,
            &mut Tracer::none(),
        ))
        .unwrap()
        .unwrap();
        commit_frame(
            &mut surface,
            prepared,
            &ticket,
            &frames,
            &mut Tracer::none(),
        )
        .unwrap();

        assert!(surface.resizes().is_empty());
        assert_eq!(surface.painted().len(), 1);
    }

    #[test]
    fn physical_dimensions_round_and_clamp() {
        assert_eq!(SurfaceGeometry::new(320.0, 240.0).physical(), (320, 240));
        assert_eq!(
            SurfaceGeometry::new(320.0, 240.0).with_scale(1.5).physical(),
            (480, 360)
        );
        assert_eq!(SurfaceGeometry::new(0.0, 0.0).physical(), (1, 1));
        assert_eq!(
            SurfaceGeometry::new(100.0, 100.0).with_scale(0.0).physical(),
            (100, 100)
        );
    }
