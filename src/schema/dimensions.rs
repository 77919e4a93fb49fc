//! Built-in dimension templates.
//!
//! Placeholders: `{Percentage}` (12%), `{Number}` (123, 123 million),
//! `{AmountUSD}` ($123 million), `{Description}` (1-3 sentences).

use super::DimensionSpec;

const PEOPLE: &str = r#"## Population Distribution
### Age Composition
- 0-4 years: {Percentage}
- 5-17 years: {Percentage}
- 18-24 years: {Percentage}
- 25-44 years: {Percentage}
- 45-64 years: {Percentage}
- 65-74 years: {Percentage}
- 75+ years: {Percentage}

### Gender Composition
- Male: {Percentage}
- Female: {Percentage}
- Other: {Percentage}

### Urban-Rural Composition
- Urban Population: {Percentage}
- Rural Population: {Percentage}

### Economic Composition
- Upper Class: {Percentage}
- Middle Class: {Percentage}
- Working Class: {Percentage}
- Below Poverty Line: {Percentage}

### Ethnic Composition <!-- at least 5 ethnic groups -->
- {EthnicGroup}: {Percentage}
- Two or more ethnicities: {Percentage}

### Language Composition <!-- at least 5 languages -->
- {Language}: {Percentage}
- Multilingual: {Percentage}

### Religious Composition <!-- at least 5 religions -->
- {Religion}: {Percentage}
- Unaffiliated/No Religion: {Percentage}

### Housing Composition
- Owned: {Percentage}
- Rented: {Percentage}
- Homeless: {Percentage}

### Population Growth
- Population Annual Growth Rate: {Percentage} per year
- Ethnic Population Growth: {Description}

## Migration
<!-- who is migrating to the state, from where, to which regions and into which industries -->

## People Metrics
- Total Population: {Number} people
- Gallup World Happiness Score: {Number} out of 10
- Human Development Index (HDI): {Number}
- Gender Inequality Index (GII): {Number} out of 1.0
- Social Mobility Index: {Number} out of 100

## Top People Challenges <!-- ethnic or class conflicts, discrimination, etc. Severity and description. At least 2. -->
- {Challenge}: {Description}"#;

const EDUCATION: &str = r#"## Education System
<!-- levels of education, types of schools, funding and curriculum -->

## Literacy
- Adult Literacy Rate: {Percentage}
- Ethnic Literacy: {Description}

## Education Metrics
- Average Years of Schooling: {Number} years
- University Enrollment Rate: {Percentage}
- Primary Schools: {Number}
- Secondary Schools: {Number}
- Universities: {Number}

## Top Education Challenges <!-- dropout rates, literacy, etc. At least 2. -->
- {Challenge}: {Description}"#;

const HEALTH: &str = r#"## Health System
<!-- insurance, state involvement, accessibility, waiting times and quality -->

## Life Expectancy
- Average Life Expectancy at Birth: {Number} years
- Male Life Expectancy: {Number} years
- Female Life Expectancy: {Number} years

## Causes of Death Composition <!-- percentage of deaths -->
- Cardiovascular Disease: {Percentage}
- Cancer: {Percentage}
- Respiratory Disease: {Percentage}
- Infectious Disease: {Percentage}
- Accidents and Injuries: {Percentage}
- Other: {Percentage}

## Health Metrics
- Infant Mortality Rate: {Number} per 1,000 live births
- Total Fertility Rate: {Number} children per woman
- Physician Density: {Number} per 1,000 population
- Hospital Bed Density: {Number} per 1,000 population

## Top Health Challenges <!-- costs, pandemics, etc. At least 2. -->
- {Challenge}: {Description}"#;

const CRIME: &str = r#"## Justice System
<!-- courts, law enforcement, prisons and how crime relates to poverty and education -->

## Crime Metrics
- Violent Crimes: {Number} per 100,000 population
- Property Crimes: {Number} per 100,000 population
- Financial Crimes: {Number} per 100,000 population
- Drug-Related Crimes: {Number} per 100,000 population
- Cybercrime: {Number} per 100,000 population
- Organized Crime: {Number} per 100,000 population

## Black Market
<!-- goods and services traded, enforcement, economic impact -->

## Top Crime Challenges <!-- trafficking, gangs, etc. At least 2. -->
- {Challenge}: {Description}"#;

const ECONOMY: &str = r#"## Economic System
<!-- roles of government, private sector and markets; the central bank -->

## Sector Contributions to GDP Composition
- Agriculture: {Percentage}
- Manufacturing: {Percentage}
- Services: {Percentage}
- Mining: {Percentage}
- Technology: {Percentage}
- Tourism and Hospitality: {Percentage}

## Government Budget
### Government Revenue Composition
- Income Tax: {Percentage}
- Corporate Tax: {Percentage}
- Sales Tax: {Percentage}
- Tariffs: {Percentage}
- Other: {Percentage}

### Government Expenditure Composition
- Healthcare: {Percentage}
- Education: {Percentage}
- Defense: {Percentage}
- Welfare: {Percentage}
- Infrastructure: {Percentage}
- Debt Interest: {Percentage}
- Other: {Percentage}

### Government Budget Metrics
- Total Annual Revenue: {AmountUSD}
- Total Annual Expenditure: {AmountUSD}

## Economic Metrics
- Gross Domestic Product (GDP): {AmountUSD}
- GDP Annual Growth Rate: {Percentage} per year
- Currency: {CurrencyName} ({CurrencyCode})
- Unemployment Rate: {Percentage}
- Inflation Rate: {Percentage} <!-- annualized -->
- Gini Coefficient: {Number} out of 1.0
- Average Annual Income: {AmountUSD} per person

## Top Economic Challenges <!-- unemployment, inflation, trade imbalances, etc. At least 2. -->
- {Challenge}: {Description}"#;

const INTERNATIONAL_RELATIONS: &str = r#"## Diplomatic Relations
<!-- allies, rivals, treaties and foreign policy -->

## Trade
### Export Goods Composition
- {Good}: {Percentage}

### Import Goods Composition
- {Good}: {Percentage}

### Export Partner Composition
- {Country}: {Percentage}

### Import Partner Composition
- {Country}: {Percentage}

### Trade Metrics
- Total Exports: {AmountUSD}
- Total Imports: {AmountUSD}

## Top International Relations Challenges <!-- territorial disputes, trade conflicts, etc. At least 2. -->
- {Challenge}: {Description}"#;

const DEFENSE: &str = r#"## Military System
<!-- structure and branches, nuclear and technological capabilities, equipment sources -->

## Military Personnel
- Active Duty Personnel: {Number}
- Reserve Personnel: {Number}

## Military Assets
- Combat Aircraft: {Number}
- Combat Helicopters: {Number}
- Unmanned Aerial Systems: {Number}
- Major Combat Ships: {Number}
- Submarines: {Number}
- Main Battle Tanks: {Number}
- Air Defense Systems: {Number}

## Top Defense Challenges <!-- terrorism, cyber threats, etc. Risk level and description. At least 2. -->
- {Challenge}: {Description}"#;

const MEDIA: &str = r#"## Media Landscape
<!-- state control and censorship, ownership, press freedom, digital adoption -->

## Media Source Composition
- Television: {Percentage}
- Social Media: {Percentage}
- Online News: {Percentage}
- Print: {Percentage}
- Radio: {Percentage}

## News Coverage Composition
- Politics: {Percentage}
- Economy: {Percentage}
- Crime: {Percentage}
- Entertainment: {Percentage}
- International: {Percentage}

## Media Metrics
- Press Freedom Index: {Number} out of 100
- Social Media Usage: {Percentage}
- Average Daily Media Consumption: {Number} hours"#;

const CULTURE: &str = r#"## Cultural Identity
<!-- traditional, family, work and religious values; national identity; individualism vs collectivism -->

## Cultural Practices
<!-- cuisine, music, art, literature, film and sports -->

## Cultural Metrics
- Soft Power Index: {Number} out of 100
- Protected Cultural Sites: {Number}
- Museums: {Number}
- Theaters: {Number}

## Top Cultural Challenges <!-- preservation, diversity, etc. At least 2. -->
- {Challenge}: {Description}"#;

const GEOGRAPHY: &str = r#"## Geographic Features
<!-- terrain, rivers, coastlines, pollution and natural resources -->

## Natural Resource Production
- Oil and Gas: {Number} barrels of oil equivalent per day
- Coal: {Number} tons per day
- Industrial Metals: {Number} tons per day

## Environmental Metrics
- Total Land Area: {Number} sq km
- CO2 Emissions: {Number} metric tons per capita
- Air Quality Index: {Number} out of 500
- Number of Endangered Species: {Number}

## Top Environmental Challenges <!-- pollution, deforestation, etc. At least 2. -->
- {Challenge}: {Description}"#;

const INFRASTRUCTURE: &str = r#"## Infrastructure
<!-- roads, rail, ports, power grid and communications; status and quality -->

## Energy Source Composition
- Coal: {Percentage}
- Natural Gas: {Percentage}
- Nuclear: {Percentage}
- Hydro: {Percentage}
- Solar: {Percentage}
- Wind: {Percentage}

## Technologies
<!-- AI, robotics, space, biotechnology; how well the state does in each -->

## Infrastructure Metrics
- Total Electricity Generation: {Number} megawatts
- Roads: {Number} km
- Railways: {Number} km
- Airports: {Number}

## Infrastructure Challenges
- {Challenge}: {Description}"#;

const GOVERNMENT: &str = r#"## Government System
<!-- structure and branches, governing documents, parties, electoral system, citizenship -->

## Government Metadata
- Government Type: {GovernmentType}
- Head of State/Government: {Title} <!-- role, not a name -->
- Country Official Name: {StateName} <!-- no special characters or colons -->
- Capital City: {CapitalCity}

## Political Participation
<!-- participation by age, gender, ethnicity and religion -->

## Policies <!-- at least 4 per type, many unique to this state -->
### Civil Rights Policies
- {PolicyType}: {Description}
### Economic and Fiscal Policies
- {PolicyType}: {Description}
### Social Welfare Policies
- {PolicyType}: {Description}
### Justice and Law Enforcement Policies
- {PolicyType}: {Description}
### Defense and Foreign Policies
- {PolicyType}: {Description}
### Environmental Policies
- {PolicyType}: {Description}

## Government Metrics
- Corruption Perception Index (CPI): {Number} out of 100
- Direction of Country: {Percentage} believe country is on right track
- Democracy Index: {Number} out of 10.0

## Top Government Challenges <!-- corruption, instability, etc. At least 2. -->
- {Challenge}: {Description}"#;

const PUBLIC_OPINION: &str = r#"## Recent Citizen Quotes <!-- at least 5, a random sample of the population; rich and specific -->
- {Name} ({Number} years old, {Gender}, {Ethnicity}, {Occupation}) - "{Quote}"

## Recent Headlines <!-- at least 5 specific viral headlines -->
- "{Headline}""#;

pub(super) fn builtin_dimensions() -> Vec<DimensionSpec> {
    vec![
        DimensionSpec::new("People", PEOPLE).with_seed_assumptions([
            "Assume a population of 25.68 million",
            "Assume a single fictional country-specific ethnic group and several real groups for the others (e.g. White, Asian, etc)",
            "Assume a single fictional country-specific religious group and several real religions for the others (e.g. Christianity, Islam, etc)",
        ]),
        DimensionSpec::new("Education", EDUCATION).with_depends_on(["People"]),
        DimensionSpec::new("Health", HEALTH).with_depends_on(["People"]),
        DimensionSpec::new("Crime", CRIME).with_depends_on(["People", "Economy"]),
        DimensionSpec::new("Economy", ECONOMY)
            .with_seed_assumptions([
                "Assume an initial GDP of 2,700,000,000 USD (2.7 billion USD)",
                "Assume all real countries (e.g. USA, China, Russia, etc) for import and export partners",
            ])
            .with_depends_on(["People", "Government"]),
        DimensionSpec::new("International Relations", INTERNATIONAL_RELATIONS)
            .with_seed_assumptions([
                "Assume all real good types (e.g. electronics, rare metals, grain, oil, etc.)",
                "Assume all real countries (e.g. USA, China, Russia, etc) for import and export partners",
            ])
            .with_depends_on(["Economy", "Defense"]),
        DimensionSpec::new("Defense", DEFENSE).with_depends_on(["Government", "International Relations"]),
        DimensionSpec::new("Media", MEDIA).with_depends_on(["Government", "Culture"]),
        DimensionSpec::new("Culture", CULTURE).with_depends_on(["People"]),
        DimensionSpec::new("Geography and Environment", GEOGRAPHY)
            .with_seed_assumptions(["Assume an area of 520k sq km"])
            .with_depends_on(["Infrastructure and Technology"]),
        DimensionSpec::new("Infrastructure and Technology", INFRASTRUCTURE).with_depends_on(["Economy"]),
        DimensionSpec::new("Government", GOVERNMENT).with_depends_on(["Public Opinion"]),
        DimensionSpec::new("Public Opinion", PUBLIC_OPINION)
            .with_depends_on(["Government", "Economy", "Media"]),
    ]
}
