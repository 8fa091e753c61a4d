//! Integration tests for the ABN Lookup library.
//!
//! These tests use wiremock to simulate the ABR XML search service
//! and test the complete flow without hitting the real API.

use abn_lookup::{
    AbnLookupClient, AbnLookupClientConfig, AbnLookupError, AuthenticationGuid, EventWindow,
    Filters, NameFilters, NameSearch, RegistrationEventSearch, ResponseFormat, Search, SearchKind,
    SearchRequest, State, GUID_ENV_VAR,
};
use serial_test::serial;
use wiremock::matchers::{any, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SERVICE_PATH: &str = "/abrxmlsearchRPC/AbrXmlSearch.asmx";

const SAMPLE_ABN_RESPONSE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<ABRPayloadSearchResults xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns="http://abr.business.gov.au/ABRXMLSearchRPC/literalTypes">
  <request>
    <identifierSearchRequest>
      <authenticationGUID>test-guid-12345</authenticationGUID>
      <identifierType>ABN</identifierType>
      <identifierValue>53004085616</identifierValue>
      <history>N</history>
    </identifierSearchRequest>
  </request>
  <response>
    <usageStatement>The Registrar of the ABR monitors the quality of the information available on this website and updates the information regularly.</usageStatement>
    <dateRegisterLastUpdated>2024-05-01</dateRegisterLastUpdated>
    <dateTimeRetrieved>2024-05-01T10:15:00.000+10:00</dateTimeRetrieved>
    <businessEntity201408>
      <recordLastUpdatedDate>2023-11-02</recordLastUpdatedDate>
      <ABN>
        <identifierValue>53004085616</identifierValue>
        <isCurrentIndicator>Y</isCurrentIndicator>
        <replacedFrom>0001-01-01</replacedFrom>
      </ABN>
      <entityStatus>
        <entityStatusCode>Active</entityStatusCode>
        <effectiveFrom>2000-11-01</effectiveFrom>
        <effectiveTo>0001-01-01</effectiveTo>
      </entityStatus>
      <ASICNumber>004085616</ASICNumber>
      <entityType>
        <entityTypeCode>PUB</entityTypeCode>
        <entityDescription>Australian Public Company</entityDescription>
      </entityType>
      <goodsAndServicesTax>
        <effectiveFrom>2000-07-01</effectiveFrom>
        <effectiveTo>0001-01-01</effectiveTo>
      </goodsAndServicesTax>
      <mainName>
        <organisationName>TELSTRA CORPORATION LIMITED</organisationName>
        <effectiveFrom>2000-11-01</effectiveFrom>
      </mainName>
      <mainBusinessPhysicalAddress>
        <stateCode>VIC</stateCode>
        <postcode>3000</postcode>
        <effectiveFrom>2000-11-01</effectiveFrom>
        <effectiveTo>0001-01-01</effectiveTo>
      </mainBusinessPhysicalAddress>
    </businessEntity201408>
  </response>
</ABRPayloadSearchResults>"#;

const SAMPLE_NAME_RESPONSE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<ABRPayloadSearchResults xmlns="http://abr.business.gov.au/ABRXMLSearchRPC/literalTypes">
  <response>
    <usageStatement>Usage statement</usageStatement>
    <searchResultsList>
      <numberOfRecords>3</numberOfRecords>
      <exceedsMaximum>N</exceedsMaximum>
      <searchResultsRecord>
        <ABN>
          <identifierValue>33051775556</identifierValue>
          <identifierStatus>Active</identifierStatus>
        </ABN>
        <mainName>
          <organisationName>TELSTRA LIMITED</organisationName>
          <score>100</score>
          <isCurrentIndicator>Y</isCurrentIndicator>
        </mainName>
        <mainBusinessPhysicalAddress>
          <stateCode>VIC</stateCode>
          <postcode>3000</postcode>
          <isCurrentIndicator>Y</isCurrentIndicator>
        </mainBusinessPhysicalAddress>
      </searchResultsRecord>
      <searchResultsRecord>
        <ABN>
          <identifierValue>53004085616</identifierValue>
          <identifierStatus>Active</identifierStatus>
        </ABN>
        <mainName>
          <organisationName>TELSTRA CORPORATION LIMITED</organisationName>
          <score>98</score>
          <isCurrentIndicator>Y</isCurrentIndicator>
        </mainName>
        <mainBusinessPhysicalAddress>
          <stateCode>VIC</stateCode>
          <postcode>3000</postcode>
          <isCurrentIndicator>Y</isCurrentIndicator>
        </mainBusinessPhysicalAddress>
      </searchResultsRecord>
      <searchResultsRecord>
        <ABN>
          <identifierValue>64086174781</identifierValue>
          <identifierStatus>Cancelled</identifierStatus>
        </ABN>
        <businessName>
          <organisationName>TELSTRA SUPER PTY LTD</organisationName>
          <score>90</score>
          <isCurrentIndicator>N</isCurrentIndicator>
        </businessName>
        <mainBusinessPhysicalAddress>
          <stateCode>NSW</stateCode>
          <postcode>2000</postcode>
          <isCurrentIndicator>Y</isCurrentIndicator>
        </mainBusinessPhysicalAddress>
      </searchResultsRecord>
    </searchResultsList>
  </response>
</ABRPayloadSearchResults>"#;

const SAMPLE_ABN_LIST_RESPONSE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<ABRPayloadSearchResults>
  <response>
    <abnList>
      <numberOfRecords>2</numberOfRecords>
      <abn>51824753556</abn>
      <abn>12345678901</abn>
    </abnList>
  </response>
</ABRPayloadSearchResults>"#;

const SAMPLE_EXCEPTION_RESPONSE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<ABRPayloadSearchResults>
  <response>
    <exception>
      <exceptionDescription>The GUID entered is not recognised as a Registered Party</exceptionDescription>
      <exceptionCode>WEBSERVICES</exceptionCode>
    </exception>
  </response>
</ABRPayloadSearchResults>"#;

fn test_config(mock_server_uri: &str) -> AbnLookupClientConfig {
    AbnLookupClientConfig {
        base_url: format!("{}{}", mock_server_uri, SERVICE_PATH),
        user_agent: "abn-lookup-test/1.0".to_string(),
        timeout_seconds: 5,
        response_format: ResponseFormat::Xml,
    }
}

fn create_test_client(mock_server_uri: &str) -> AbnLookupClient {
    AbnLookupClient::with_config("test-guid-12345", test_config(mock_server_uri)).unwrap()
}

fn method_path(method_name: &str) -> String {
    format!("{}/{}", SERVICE_PATH, method_name)
}

#[tokio::test]
async fn test_search_by_abn() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(method_path("ABRSearchByABN")))
        .and(query_param("searchString", "53004085616"))
        .and(query_param("includeHistoricalDetails", "N"))
        .and(query_param("authenticationGuid", "test-guid-12345"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE_ABN_RESPONSE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let results = client.search(&Search::abn("53004085616")).await.unwrap();
    let records: Vec<_> = results.collect();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].identifier(), Some("53004085616"));
    assert_eq!(records[0].identifier_status(), Some("Active"));
    assert_eq!(
        records[0].organisation_name(),
        Some("TELSTRA CORPORATION LIMITED")
    );
    assert_eq!(records[0].postcode(), Some("3000"));
    assert_eq!(records[0].text(&["ASICNumber"]), Some("004085616"));
}

#[tokio::test]
async fn test_search_by_asic_with_history() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(method_path("ABRSearchByASIC")))
        .and(query_param("searchString", "004085616"))
        .and(query_param("includeHistoricalDetails", "Y"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE_ABN_RESPONSE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let record = client.search_by_asic("004085616", true).await.unwrap();

    assert_eq!(record.identifier(), Some("53004085616"));
}

#[tokio::test]
async fn test_search_by_name_preserves_order() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(method_path("ABRSearchByNameSimpleProtocol")))
        .and(query_param("name", "Telstra"))
        .and(query_param("VIC", "Y"))
        .and(query_param("NSW", "N"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE_NAME_RESPONSE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let results = client
        .search_by_name(NameSearch {
            name: "Telstra".to_string(),
            filters: NameFilters {
                state: State::Vic.into(),
                ..Default::default()
            },
        })
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    let ids: Vec<_> = results
        .map(|record| record.identifier().unwrap_or_default().to_string())
        .collect();
    assert_eq!(ids, vec!["33051775556", "53004085616", "64086174781"]);
}

#[tokio::test]
async fn test_search_results_are_consumed_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(method_path("ABRSearchByNameSimpleProtocol")))
        .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE_NAME_RESPONSE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let mut results = client.search(&Search::name("Telstra")).await.unwrap();

    let first = results.next().unwrap();
    assert_eq!(first.organisation_name(), Some("TELSTRA LIMITED"));
    assert_eq!(results.by_ref().count(), 2);
    assert!(results.next().is_none());
}

#[tokio::test]
async fn test_search_by_postcode_abn_list() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(method_path("SearchByPostcode")))
        .and(query_param("postcode", "2000"))
        .and(query_param("state", "ALL"))
        .and(query_param("activeABNsOnly", "N"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE_ABN_LIST_RESPONSE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let records: Vec<_> = client
        .search(&Search::postcode("2000"))
        .await
        .unwrap()
        .collect();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].identifier(), Some("51824753556"));
    assert_eq!(records[1].identifier(), Some("12345678901"));
}

#[tokio::test]
async fn test_search_by_registration_event_month() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(method_path("SearchByRegistrationEvent")))
        .and(query_param("month", "1"))
        .and(query_param("year", "2020"))
        .and(query_param("state", "VIC"))
        .and(query_param("postcode", "3000"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE_ABN_LIST_RESPONSE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let results = client
        .search_by_registration_event(RegistrationEventSearch {
            window: EventWindow::Month {
                month: 1,
                year: 2020,
            },
            filters: Filters::default().postcode("3000").state(State::Vic),
        })
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn test_execute_loose_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(method_path("SearchByUpdateEvent")))
        .and(query_param("eventType", "GST"))
        .and(query_param("fromDate", "2020-01-01"))
        .and(query_param("toDate", "2020-12-31"))
        .and(query_param("postcode", "3000"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE_NAME_RESPONSE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let request = SearchRequest::new(SearchKind::UpdateEvent)
        .param("eventType", "GST")
        .param("fromDate", "2020-01-01")
        .param("toDate", "2020-12-31")
        .param("postcode", "3000");
    let results = client.execute(request).await.unwrap();

    assert_eq!(results.len(), 3);
}

#[tokio::test]
async fn test_empty_optional_params_not_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(method_path("SearchByCharity")))
        .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE_ABN_LIST_RESPONSE))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let request = SearchRequest::new(SearchKind::Charity)
        .param("postcode", "")
        .param("state", "NSW");
    client.execute(request).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let query = requests[0].url.query().unwrap_or_default();
    assert!(!query.contains("postcode="));
    assert!(query.contains("state=NSW"));
}

#[tokio::test]
async fn test_missing_parameter_makes_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE_NAME_RESPONSE))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());

    for kind in SearchKind::ALL {
        if kind == SearchKind::Charity {
            continue;
        }
        let result = client.execute(SearchRequest::new(kind)).await;
        match result {
            Err(AbnLookupError::MissingParameter { .. }) => {}
            other => panic!("Expected MissingParameter for {}, got {:?}", kind, other),
        }
    }

    let result = client.search(&Search::abn("")).await;
    assert!(matches!(result, Err(AbnLookupError::MissingParameter { .. })));
}

#[tokio::test]
async fn test_truncated_response_is_malformed() {
    let mock_server = MockServer::start().await;

    let truncated = &SAMPLE_NAME_RESPONSE[..SAMPLE_NAME_RESPONSE.len() - 200];
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(truncated))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let result = client.search(&Search::name("Telstra")).await;

    match result {
        Err(AbnLookupError::MalformedResponse { .. }) => {}
        other => panic!("Expected MalformedResponse, got {:?}", other),
    }
}

#[tokio::test]
async fn test_upstream_exception() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE_EXCEPTION_RESPONSE))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let result = client.search_by_abn("53004085616", false).await;

    match result {
        Err(AbnLookupError::Upstream { code, description }) => {
            assert_eq!(code, "WEBSERVICES");
            assert!(description.contains("GUID"));
        }
        other => panic!("Expected Upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_http_error_is_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let result = client.search(&Search::abn("invalid")).await;

    assert!(matches!(result, Err(AbnLookupError::Transport(_))));
}

#[tokio::test]
async fn test_json_response_format() {
    let mock_server = MockServer::start().await;

    let body = r#"callback({"ABRPayloadSearchResults":{"response":{"businessEntity":{"ABN":{"identifierValue":"53004085616"}}}}})"#;
    Mock::given(method("GET"))
        .and(path(method_path("ABRSearchByABN")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&mock_server)
        .await;

    let config = AbnLookupClientConfig {
        response_format: ResponseFormat::Json,
        ..test_config(&mock_server.uri())
    };
    let client = AbnLookupClient::with_config("test-guid-12345", config).unwrap();
    let record = client.search_by_abn("53004085616", false).await.unwrap();

    assert_eq!(record.identifier(), Some("53004085616"));
}

#[tokio::test]
async fn test_json_format_against_xml_endpoint_is_malformed() {
    let mock_server = MockServer::start().await;

    // The method path is the same for both formats; this endpoint answers in XML
    Mock::given(method("GET"))
        .and(path(method_path("ABRSearchByABN")))
        .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE_ABN_RESPONSE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = AbnLookupClientConfig {
        response_format: ResponseFormat::Json,
        ..test_config(&mock_server.uri())
    };
    let client = AbnLookupClient::with_config("test-guid-12345", config).unwrap();
    let result = client.search_by_abn("53004085616", false).await;

    match result {
        Err(AbnLookupError::MalformedResponse { message }) => {
            assert!(message.contains("invalid JSON"));
        }
        other => panic!("Expected MalformedResponse, got {:?}", other),
    }
}

#[tokio::test]
#[serial]
async fn test_explicit_guid_overrides_environment() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("authenticationGuid", "explicit-guid"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE_ABN_RESPONSE))
        .expect(1)
        .mount(&mock_server)
        .await;

    std::env::set_var(GUID_ENV_VAR, "env-guid");

    let guid = AuthenticationGuid::resolve(Some("explicit-guid")).unwrap();
    let client = AbnLookupClient::with_guid(guid, test_config(&mock_server.uri())).unwrap();
    let result = client.search_by_abn("53004085616", false).await;

    std::env::remove_var(GUID_ENV_VAR);

    assert!(result.is_ok());
}

#[tokio::test]
#[serial]
async fn test_guid_from_environment() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("authenticationGuid", "env-guid"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE_ABN_RESPONSE))
        .expect(1)
        .mount(&mock_server)
        .await;

    std::env::set_var(GUID_ENV_VAR, "env-guid");
    let client = AbnLookupClient::from_env_with_config(test_config(&mock_server.uri()));
    std::env::remove_var(GUID_ENV_VAR);

    let record = client.unwrap().search_by_abn("53004085616", false).await;
    assert!(record.is_ok());
}

#[test]
#[serial]
fn test_missing_guid_is_missing_parameter() {
    std::env::remove_var(GUID_ENV_VAR);

    let err = AuthenticationGuid::resolve(None).unwrap_err();
    assert!(matches!(err, AbnLookupError::MissingParameter { .. }));

    let err = AbnLookupClient::from_env().unwrap_err();
    assert!(err.is_request_error());
}
