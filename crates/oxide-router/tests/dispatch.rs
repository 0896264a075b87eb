//! End-to-end dispatch through closures and controllers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use oxide_router::{
    BoxFuture, Controller, ControllerRegistry, Handler, HandlerResult, Method, PathParams,
    PathPattern, Request, Response, Router, RouterError,
};

/// Renders the captured parameters as `name=value` pairs.
async fn echo(req: Request) -> HandlerResult {
    let pairs: Vec<String> = req.params.iter().map(|(k, v)| format!("{k}={v}")).collect();
    Ok(Response::text(pairs.join(",")))
}

async fn text(router: &Router, method: &str, path: &str) -> String {
    router
        .handle(method, path)
        .await
        .unwrap_or_else(|e| panic!("{method} {path} failed: {e}"))
        .body_string()
        .unwrap_or_default()
}

struct Pages;

impl Controller for Pages {
    fn actions(&self) -> &[&'static str] {
        &["show", "private"]
    }

    fn before<'a>(
        &'a mut self,
        action: &'a str,
        request: &'a Request,
    ) -> BoxFuture<'a, Option<Response>> {
        async move {
            let signed_in = request.get_header("Authorization").is_some();
            (action == "private" && !signed_in).then(|| Response::redirect("/login"))
        }
        .boxed()
    }

    fn invoke<'a>(&'a mut self, action: &'a str, request: Request) -> BoxFuture<'a, HandlerResult> {
        async move {
            match action {
                "show" => {
                    let slug = request.param("slug").unwrap_or("index");
                    Ok(Response::from(format!("<h1>{slug}</h1>")))
                }
                "private" => Ok(Response::text("secret")),
                other => Err(format!("no action {other}").into()),
            }
        }
        .boxed()
    }

    fn after(&mut self, _action: &str, response: Response) -> Response {
        response.header("X-Rendered-By", "Pages")
    }
}

fn pages_router() -> (Router, Arc<AtomicUsize>) {
    let created = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&created);

    let mut controllers = ControllerRegistry::new();
    controllers.register("App.Pages", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Pages
    });

    let mut router = Router::with_controllers(controllers);
    router
        .action(&["GET"], "/pages/{slug?}", "App.Pages@show")
        .unwrap()
        .action(&["GET", "POST"], "/private", "App.Pages@private")
        .unwrap();

    (router, created)
}

#[tokio::test]
async fn parameters_round_trip_through_dispatch() {
    let templates = [
        "/users/{id}",
        "/blog/{year:num}/{month:num}/{slug}",
        "/files/{dir}/{name}",
    ];
    let mut router = Router::new();
    for template in templates {
        router.get(template, echo).unwrap();
    }

    for template in templates {
        let pattern = PathPattern::new(template).unwrap();
        let params: PathParams = pattern
            .variable_names()
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), format!("{}{i}", i + 1)))
            .collect();
        let path = pattern.reverse(&params).unwrap();

        let expected: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        assert_eq!(text(&router, "GET", &path).await, expected.join(","));
    }
}

#[tokio::test]
async fn optional_slug_matches_with_and_without_value() {
    let mut router = Router::new();
    router.get("/pages/{slug?}", echo).unwrap();

    assert_eq!(text(&router, "GET", "/pages").await, "");
    assert_eq!(text(&router, "GET", "/pages/anything").await, "slug=anything");
}

#[tokio::test]
async fn numeric_class_falls_through_to_not_found() {
    let mut router = Router::new();
    router.get("/orders/{id:num}", echo).unwrap();

    let err = router.handle("GET", "/orders/12x").await.unwrap_err();
    assert!(matches!(err, RouterError::NotFound { .. }));
}

#[tokio::test]
async fn second_registration_of_a_template_wins() {
    let mut router = Router::new();
    router
        .get("/about", |_| async { Ok(Response::text("old")) })
        .unwrap()
        .get("/about/", |_| async { Ok(Response::text("new")) })
        .unwrap();

    assert_eq!(router.routes(Method::Get), ["/about"]);
    assert_eq!(text(&router, "GET", "/about").await, "new");
}

#[tokio::test]
async fn controller_action_with_hooks() {
    let (router, created) = pages_router();

    let res = router.handle("GET", "/pages/contact").await.unwrap();
    assert_eq!(res.body_string().as_deref(), Some("<h1>contact</h1>"));
    assert_eq!(res.headers.get("X-Rendered-By").map(String::as_str), Some("Pages"));

    let res = router.handle("HEAD", "/pages").await.unwrap();
    assert_eq!(res.body_string().as_deref(), Some("<h1>index</h1>"));

    // One instance while validating at registration, one per request.
    assert_eq!(created.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn before_hook_short_circuits_action() {
    let (router, _) = pages_router();

    let res = router.handle("POST", "/private").await.unwrap();
    assert_eq!(res.status, 302);
    assert!(res.headers.get("X-Rendered-By").is_none());

    let res = router
        .dispatch(Request::post("/private").header("Authorization", "Bearer t"))
        .await
        .unwrap();
    assert_eq!(res.body_string().as_deref(), Some("secret"));
}

#[test]
fn unknown_action_fails_at_registration() {
    let (mut router, _) = pages_router();
    let err = router
        .action(&["GET"], "/edit", "App.Pages@edit")
        .unwrap_err();
    assert!(matches!(err, RouterError::ActionNotFound { .. }));
    assert_eq!(err.status_code(), 500);
}

#[test]
fn handler_strings_are_parsed() {
    assert!(matches!(
        Handler::action("App.Pages@show"),
        Ok(Handler::Action { ref controller, ref action })
            if controller == "App.Pages" && action == "show"
    ));
    assert!(Handler::action("App.Pages").is_err());
}
