use docflex::bson::oid::ObjectId;
use docflex::client::ConnectOptions;
use docflex::connection::DEFAULT_CLIENT_LABEL;
use docflex::docflex::DocFlex;
use docflex::errors::DocFlexResult;
use std::future::Future;

/// Runs an async test against a fresh context and always cleans up after it.
///
/// The context's collections are dropped even when the test fails; the test
/// error is reported in preference to a cleanup error.
pub async fn run_test<T, Fut>(test: T)
where
    T: FnOnce(TestContext) -> Fut,
    Fut: Future<Output = DocFlexResult<()>>,
{
    let ctx = match create_test_context().await {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };
    run_in_context(ctx, test).await
}

/// Runs an async test against a private database on the MongoDB server named
/// by `DOCFLEX_TEST_MONGODB_URI`.
///
/// The test is skipped with a warning when the variable is not set.
pub async fn run_server_test<T, Fut>(test: T)
where
    T: FnOnce(TestContext) -> Fut,
    Fut: Future<Output = DocFlexResult<()>>,
{
    let address = match server_address() {
        Some(address) => address,
        None => {
            log::warn!("{} is not set, skipping MongoDB server test", MONGODB_URI_VAR);
            return;
        }
    };

    let ctx = match DocFlex::builder()
        .connect_with(DEFAULT_CLIENT_LABEL, &address, ConnectOptions::new())
        .open()
        .await
    {
        Ok(docflex) => TestContext::new(address, docflex),
        Err(e) => panic!("Before run failed: {:?}", e),
    };
    run_in_context(ctx, test).await
}

async fn run_in_context<T, Fut>(ctx: TestContext, test: T)
where
    T: FnOnce(TestContext) -> Fut,
    Fut: Future<Output = DocFlexResult<()>>,
{
    let test_result = test(ctx.clone()).await;
    let after_result = cleanup(ctx).await;

    if let Err(e) = test_result {
        panic!("Test failed: {:?}", e);
    }
    if let Err(e) = after_result {
        panic!("After run failed: {:?}", e);
    }
}

/// Environment variable holding the base address of a test MongoDB server,
/// for example `mongodb://localhost:27017`.
pub const MONGODB_URI_VAR: &str = "DOCFLEX_TEST_MONGODB_URI";

/// The test server address with a database name no other test uses.
pub fn server_address() -> Option<String> {
    let base = std::env::var(MONGODB_URI_VAR).ok()?;
    let base = base.trim();
    if base.is_empty() {
        return None;
    }
    Some(format!(
        "{}/docflex_{}",
        base.trim_end_matches('/'),
        ObjectId::new().to_hex()
    ))
}

#[derive(Clone)]
pub struct TestContext {
    address: String,
    docflex: DocFlex,
}

impl TestContext {
    pub fn new(address: String, docflex: DocFlex) -> Self {
        Self { address, docflex }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn docflex(&self) -> DocFlex {
        self.docflex.clone()
    }
}

/// A `memory://` address no other test uses.
pub fn random_address(database: &str) -> String {
    format!("memory://{}/{}", ObjectId::new().to_hex(), database)
}

/// Opens a context whose default client points at a private in-memory server.
pub async fn create_test_context() -> DocFlexResult<TestContext> {
    let address = random_address("test");
    let docflex = DocFlex::builder()
        .connect_with(DEFAULT_CLIENT_LABEL, &address, ConnectOptions::new())
        .open()
        .await?;
    Ok(TestContext::new(address, docflex))
}

/// Drops the collection of every model the test used.
pub async fn cleanup(ctx: TestContext) -> DocFlexResult<()> {
    ctx.docflex().drop_all_collections().await
}
