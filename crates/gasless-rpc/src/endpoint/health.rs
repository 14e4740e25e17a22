use crate::context::Context;
use crate::Error;

pub async fn health_endpoint(ctx: &Context) -> Result<bool, Error> {
    Ok(ctx.execution.is_healthy().await)
}

#[cfg(test)]
mod tests {
    use crate::endpoint::health::health_endpoint;
    use crate::testing::TestEnvironment;

    #[tokio::test]
    async fn health_reflects_the_chain() {
        let test = TestEnvironment::new();

        assert!(health_endpoint(test.context()).await.unwrap());
    }
}
